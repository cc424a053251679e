//! GET /usercontent - content produced by one user

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use std::sync::Arc;

use super::response::{error_response, json_response};
use crate::ranking::RawQuery;
use crate::server::AppState;

pub async fn handle_user_content(state: Arc<AppState>, query: Option<&str>) -> Response<Full<Bytes>> {
    let raw = match RawQuery::parse(query) {
        Ok(raw) => raw,
        Err(e) => return error_response(&e),
    };

    match state.service.user_content(&raw).await {
        Ok(rows) => json_response(StatusCode::OK, &rows),
        Err(e) => error_response(&e),
    }
}
