//! HTTP server implementation
//!
//! Pattern adapted from holo-host/rust/holo-gateway/src/lib.rs
//! Uses hyper http1 with TokioIo for async handling.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Args;
use crate::routes;
use crate::services::LeaderboardService;
use crate::types::Result;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Which store implementation is serving requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mongo => "mongodb",
            Self::Memory => "memory",
        }
    }
}

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub service: LeaderboardService,
    pub store_backend: StoreBackend,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, service: LeaderboardService, store_backend: StoreBackend) -> Self {
        Self {
            args,
            service,
            store_backend,
            started_at: Instant::now(),
        }
    }
}

/// Bind the configured address and serve forever
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Leaderboard listening on {}", state.args.listen);

    if state.store_backend == StoreBackend::Memory {
        warn!("Serving from the in-memory store - leaderboards start empty");
    }

    serve(listener, state).await
}

/// Accept loop over an already bound listener
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    info!("[{}] {} {}", addr, method, path);

    let response = dispatch(state, &method, &path, query.as_deref()).await;
    Ok(to_boxed(response))
}

/// Produce the response for one request
pub async fn dispatch(
    state: Arc<AppState>,
    method: &Method,
    path: &str,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    match (method, path) {
        (&Method::OPTIONS, _) => preflight_response(),

        // Liveness probe
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => routes::health_check(state),

        // Readiness probe - 503 while the store is unreachable
        (&Method::GET, "/ready") | (&Method::GET, "/readyz") => {
            routes::readiness_check(state).await
        }

        (&Method::GET, "/version") => routes::version_info(),

        (&Method::GET, "/content") => routes::handle_content(state, query).await,
        (&Method::GET, "/skapps") => routes::handle_skapps(state, query).await,
        (&Method::GET, "/users") => routes::handle_users(state, query).await,
        (&Method::GET, "/usercontent") => routes::handle_user_content(state, query).await,

        _ => not_found_response(path),
    }
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", hyper::header::HeaderValue::from_static("*"));
    headers.insert("Access-Control-Allow-Headers", hyper::header::HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        hyper::header::HeaderValue::from_static("GET, OPTIONS"),
    );
    response
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": format!("No route for {}", path),
        "code": "NOT_FOUND",
    });
    routes::json_response(StatusCode::NOT_FOUND, &body)
}
