//! Services layer for the leaderboard
//!
//! ## Services
//!
//! - **Leaderboard**: request-level orchestration of ranking, assembly and discovery
//! - **Discovery**: insert-if-absent of user records for newly referenced keys
//! - **Scraper**: outbound notification to the external scraper

pub mod discovery;
pub mod leaderboard;
pub mod scraper;

pub use discovery::{DiscoveryOutcome, DiscoveryTrigger};
pub use leaderboard::{LeaderboardService, UserLeaderboard};
pub use scraper::{DiscoveryNotifier, NotifyOutcome, ScraperClient, ScraperConfig};
