//! User discovery
//!
//! When a request names a well-formed user key the service makes sure a
//! tracking record exists for it and asks the scraper to crawl it:
//!
//! 1. Reject malformed keys without touching the store
//! 2. Insert-if-absent of the `users` record
//! 3. Hand the scraper notification to a background task
//!
//! Nothing here ever fails a request. Store and scraper errors are logged.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::scraper::{DiscoveryNotifier, NotifyOutcome};
use crate::ranking::is_valid_user_pk;
use crate::store::IdentityStore;

/// Result of a discovery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// Key was malformed; nothing was done
    NotAttempted,
    /// This call created the tracking record
    NewlyDiscovered,
    AlreadyKnown,
    /// The store failed; logged
    Failed,
}

/// Upserts identity records and notifies the scraper
#[derive(Clone)]
pub struct DiscoveryTrigger {
    identities: Arc<dyn IdentityStore>,
    notifier: Arc<dyn DiscoveryNotifier>,
}

impl DiscoveryTrigger {
    pub fn new(identities: Arc<dyn IdentityStore>, notifier: Arc<dyn DiscoveryNotifier>) -> Self {
        Self {
            identities,
            notifier,
        }
    }

    /// Record `user_pk` if it is new and schedule a scraper notification
    pub async fn try_discover(&self, user_pk: &str) -> DiscoveryOutcome {
        if !is_valid_user_pk(user_pk) {
            return DiscoveryOutcome::NotAttempted;
        }

        let outcome = match self.identities.insert_if_absent(user_pk, Utc::now()).await {
            Ok(true) => {
                info!(user_pk = %user_pk, "Discovered new user");
                DiscoveryOutcome::NewlyDiscovered
            }
            Ok(false) => {
                debug!(user_pk = %user_pk, "User already known");
                DiscoveryOutcome::AlreadyKnown
            }
            Err(e) => {
                warn!(user_pk = %user_pk, error = %e, "Failed to upsert discovered user");
                DiscoveryOutcome::Failed
            }
        };

        self.spawn_notify(user_pk.to_string());
        outcome
    }

    /// Run the whole discovery in the background
    pub fn spawn_discover(&self, user_pk: String) -> JoinHandle<DiscoveryOutcome> {
        let trigger = self.clone();
        tokio::spawn(async move { trigger.try_discover(&user_pk).await })
    }

    fn spawn_notify(&self, user_pk: String) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            match notifier.notify(&user_pk).await {
                NotifyOutcome::Accepted => {
                    debug!(user_pk = %user_pk, "Scraper notified");
                }
                NotifyOutcome::RateLimited => {
                    info!(user_pk = %user_pk, "Scraper notification rejected: too many requests");
                }
                NotifyOutcome::Failed(reason) => {
                    warn!(user_pk = %user_pk, error = %reason, "Scraper notification failed");
                }
            }
        });
    }
}
