//! Leaderboard - ranked leaderboards over scraped content records
//!
//! Serves content, skapp and user leaderboards computed from the `entries`
//! collection, and triggers discovery of users the leaderboards reference
//! for the first time.
//!
//! ## Modules
//!
//! - **Ranking**: query normalization, grouping, ranking and row assembly
//! - **Store**: event, identity and list stores (MongoDB and in-memory)
//! - **Services**: request orchestration, user discovery, scraper client
//! - **Server**: hyper http1 transport and routes

pub mod config;
pub mod db;
pub mod ranking;
pub mod routes;
pub mod server;
pub mod services;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{LeaderboardError, Result};
