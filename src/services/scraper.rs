//! Scraper notification client
//!
//! Tells the external scraper service to crawl a newly referenced user.
//! Calls are never retried; the outcome is only logged by the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

/// Scraper client configuration
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Scraper base URL including port, e.g. `http://localhost:3001`
    pub base_url: String,
    /// Timeout for the whole notification call
    pub timeout: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            timeout: Duration::from_millis(5000),
        }
    }
}

impl ScraperConfig {
    pub fn endpoint(&self) -> String {
        format!("{}/userdiscovery", self.base_url.trim_end_matches('/'))
    }
}

/// Result of one notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Accepted,
    /// The scraper answered 429; expected under load
    RateLimited,
    Failed(String),
}

/// Outbound signal that a user should be scraped
#[async_trait]
pub trait DiscoveryNotifier: Send + Sync {
    async fn notify(&self, user_pk: &str) -> NotifyOutcome;
}

/// HTTP notifier calling `GET {scraper}/userdiscovery?userPK=..&scrape=true`
pub struct ScraperClient {
    config: ScraperConfig,
    http_client: reqwest::Client,
}

impl ScraperClient {
    pub fn new(config: ScraperConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("leaderboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
        }
    }
}

#[async_trait]
impl DiscoveryNotifier for ScraperClient {
    async fn notify(&self, user_pk: &str) -> NotifyOutcome {
        let response = self
            .http_client
            .get(self.config.endpoint())
            .query(&[("userPK", user_pk), ("scrape", "true")])
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => NotifyOutcome::Accepted,
            Ok(resp) if resp.status() == StatusCode::TOO_MANY_REQUESTS => NotifyOutcome::RateLimited,
            Ok(resp) => NotifyOutcome::Failed(format!("scraper returned HTTP {}", resp.status())),
            Err(e) => NotifyOutcome::Failed(e.to_string()),
        }
    }
}
