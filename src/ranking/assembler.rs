//! Actor row assembly: profile metadata join and placeholder rows

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::engine::RankedPage;
use super::model::{is_valid_user_pk, IdentityProfile};
use super::request::RankingRequest;
use super::rows::UserRow;
use crate::store::IdentityStore;

/// Turns a ranked actor page into response rows
///
/// Every lookup here is best effort: a failing identity store degrades to
/// empty metadata rather than failing the response.
#[derive(Clone)]
pub struct ResultAssembler {
    identities: Arc<dyn IdentityStore>,
}

impl ResultAssembler {
    pub fn new(identities: Arc<dyn IdentityStore>) -> Self {
        Self { identities }
    }

    pub async fn assemble_users(&self, request: &RankingRequest, page: RankedPage) -> Vec<UserRow> {
        let RankedPage {
            rows,
            total_groups,
            excluded_actors,
        } = page;
        let mut rows: Vec<UserRow> = rows.into_iter().map(UserRow::from).collect();

        if !rows.is_empty() {
            let profiles = self.profiles(&rows).await;
            for row in &mut rows {
                if let Some(profile) = profiles.get(&row.user_pk) {
                    row.user_metadata = profile.clone();
                }
            }
        }

        let key = request.filter_by_actor.as_str();
        if total_groups == 0 && is_valid_user_pk(key) && !excluded_actors.contains(key) {
            rows.push(self.placeholder(key).await);
        }

        rows
    }

    async fn profiles(&self, rows: &[UserRow]) -> HashMap<String, IdentityProfile> {
        let keys: Vec<String> = rows.iter().map(|r| r.user_pk.clone()).collect();
        match self.identities.find_many(&keys).await {
            Ok(identities) => identities
                .into_iter()
                .map(|identity| (identity.user_pk, identity.profile))
                .collect(),
            Err(e) => {
                warn!(error = %e, rows = keys.len(), "Identity lookup failed, returning rows without metadata");
                HashMap::new()
            }
        }
    }

    /// Zero-counter row ranked at the number of known identities, or 0 when
    /// the count fails
    async fn placeholder(&self, key: &str) -> UserRow {
        let rank = match self.identities.count().await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Identity count failed for placeholder rank");
                0
            }
        };

        let metadata = match self.identities.find(key).await {
            Ok(Some(identity)) => identity.profile,
            Ok(None) => IdentityProfile::default(),
            Err(e) => {
                warn!(user_pk = %key, error = %e, "Identity lookup failed for placeholder");
                IdentityProfile::default()
            }
        };

        debug!(user_pk = %key, rank, "Appending placeholder row");
        UserRow::placeholder(key, rank, metadata)
    }
}
