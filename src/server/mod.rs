//! HTTP server

pub mod http;

pub use http::{dispatch, run, serve, AppState, StoreBackend};
