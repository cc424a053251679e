//! Leaderboard routes: /content, /skapps, /users

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use std::sync::Arc;

use super::response::{error_response, json_response};
use crate::ranking::RawQuery;
use crate::server::AppState;

/// GET /content
pub async fn handle_content(state: Arc<AppState>, query: Option<&str>) -> Response<Full<Bytes>> {
    let result = match RawQuery::parse(query) {
        Ok(raw) => state.service.content(&raw).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(rows) => json_response(StatusCode::OK, &rows),
        Err(e) => error_response(&e),
    }
}

/// GET /skapps
pub async fn handle_skapps(state: Arc<AppState>, query: Option<&str>) -> Response<Full<Bytes>> {
    let result = match RawQuery::parse(query) {
        Ok(raw) => state.service.skapps(&raw).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(rows) => json_response(StatusCode::OK, &rows),
        Err(e) => error_response(&e),
    }
}

/// GET /users
///
/// Answers 202 when the filtered user was discovered by this request.
pub async fn handle_users(state: Arc<AppState>, query: Option<&str>) -> Response<Full<Bytes>> {
    let result = match RawQuery::parse(query) {
        Ok(raw) => state.service.users(&raw).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(leaderboard) => {
            let status = if leaderboard.newly_discovered {
                StatusCode::ACCEPTED
            } else {
                StatusCode::OK
            };
            json_response(status, &leaderboard.rows)
        }
        Err(e) => error_response(&e),
    }
}
