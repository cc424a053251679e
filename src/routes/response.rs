//! JSON response helpers shared by the API routes

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::{debug, error};

use crate::types::LeaderboardError;

/// Error body returned by every route
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: &'static str,
}

fn internal_error() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(
        br#"{"error":"Internal error","code":"INTERNAL_ERROR"}"#,
    )));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

/// Serialize `data` as a JSON response with CORS headers
///
/// API responses close the connection after every reply.
pub fn json_response<T: Serialize>(status: StatusCode, data: &T) -> Response<Full<Bytes>> {
    let body = match serde_json::to_vec(data) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            return internal_error();
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Cache-Control", "no-cache")
        .header("Access-Control-Allow-Origin", "*")
        .header("Connection", "close")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| internal_error())
}

/// Map an error to its status and `{error, code}` body
pub fn error_response(err: &LeaderboardError) -> Response<Full<Bytes>> {
    match err {
        LeaderboardError::InvalidParameter(_) => debug!("Rejected request: {}", err),
        _ => error!("Request failed: {}", err),
    }

    let body = ApiError {
        error: err.to_string(),
        code: err.code(),
    };
    json_response(err.status_code(), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_error_body_and_headers() {
        let response = error_response(&LeaderboardError::invalid("param 'limit' must be a positive integer"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["Connection"], "close");
        assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "param 'limit' must be a positive integer");
        assert_eq!(json["code"], "INVALID_PARAMETER");
    }

    #[test]
    fn test_store_failure_is_503() {
        let response = error_response(&LeaderboardError::StoreUnavailable("down".into()));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
