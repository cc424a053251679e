//! HTTP routes for the leaderboard

pub mod health;
pub mod ranking;
pub mod response;
pub mod user_content;

pub use health::{health_check, readiness_check, version_info};
pub use ranking::{handle_content, handle_skapps, handle_users};
pub use response::{error_response, json_response};
pub use user_content::handle_user_content;
