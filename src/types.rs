//! Shared error and result types

use hyper::StatusCode;
use thiserror::Error;

/// Errors produced by the leaderboard service
#[derive(Debug, Error)]
pub enum LeaderboardError {
    /// Malformed or out-of-range request input; never reaches the store
    #[error("{0}")]
    InvalidParameter(String),

    /// Backing store failure (connection, query, decode)
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Invalid startup configuration
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl LeaderboardError {
    /// HTTP status the transport layer reports for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter(_) => "INVALID_PARAMETER",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Shorthand for an invalid-parameter error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }
}

impl From<mongodb::error::Error> for LeaderboardError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl From<bson::de::Error> for LeaderboardError {
    fn from(err: bson::de::Error) -> Self {
        Self::StoreUnavailable(format!("failed to decode document: {err}"))
    }
}

impl From<bson::ser::Error> for LeaderboardError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Internal(format!("failed to encode document: {err}"))
    }
}

impl From<serde_json::Error> for LeaderboardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("serialization failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, LeaderboardError>;
