//! Configuration for the leaderboard service
//!
//! CLI arguments and environment variable handling using clap.

use chrono::Duration as ChronoDuration;
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::ranking::EngineConfig;
use crate::services::ScraperConfig;
use crate::types::{LeaderboardError, Result};

/// Leaderboard - ranked content, skapp and user leaderboards
#[derive(Parser, Debug, Clone)]
#[command(name = "leaderboard")]
#[command(about = "Leaderboard API over scraped content records")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGO_CONNECTION_STRING", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGO_DB_NAME", default_value = "content-record")]
    pub mongodb_db: String,

    /// Scraper API base URL, without port
    #[arg(long, env = "SCRAPERAPI_URL", default_value = "http://localhost")]
    pub scraper_url: String,

    /// Scraper API port
    #[arg(long, env = "SCRAPERAPI_PORT", default_value = "3001")]
    pub scraper_port: u16,

    /// Timeout for scraper notifications in milliseconds
    #[arg(long, env = "DISCOVERY_TIMEOUT_MS", default_value = "5000")]
    pub discovery_timeout_ms: u64,

    /// Lookback of the "last24H" counters in hours
    #[arg(long, env = "RECENT_WINDOW_HOURS", default_value = "24")]
    pub recent_window_hours: u32,

    /// Log every aggregation pipeline at info level
    #[arg(long, env = "DEBUG_PIPELINE", default_value = "false")]
    pub debug_pipeline: bool,

    /// Enable development mode (in-memory store when MongoDB is unreachable)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

impl Args {
    /// Scraper base URL including port
    pub fn scraper_base_url(&self) -> String {
        format!("{}:{}", self.scraper_url.trim_end_matches('/'), self.scraper_port)
    }

    pub fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig {
            base_url: self.scraper_base_url(),
            timeout: Duration::from_millis(self.discovery_timeout_ms),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            recent_window: ChronoDuration::hours(i64::from(self.recent_window_hours)),
            ..EngineConfig::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.recent_window_hours == 0 {
            return Err(LeaderboardError::Config(
                "RECENT_WINDOW_HOURS must be greater than zero".to_string(),
            ));
        }

        if self.discovery_timeout_ms == 0 {
            return Err(LeaderboardError::Config(
                "DISCOVERY_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        let scraper = self.scraper_base_url();
        match reqwest::Url::parse(&scraper) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(LeaderboardError::Config(format!(
                    "SCRAPERAPI_URL must use http or https, got '{}'",
                    url.scheme()
                )))
            }
            Err(e) => {
                return Err(LeaderboardError::Config(format!(
                    "SCRAPERAPI_URL is not a valid URL ({}): {}",
                    scraper, e
                )))
            }
        }

        Ok(())
    }
}
