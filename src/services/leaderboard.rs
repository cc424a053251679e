//! Leaderboard service
//!
//! Glue between the transport and the ranking core: normalizes the query,
//! runs the engine and assembles rows, and decides when discovery runs.

use std::sync::Arc;

use tracing::debug;

use super::discovery::{DiscoveryOutcome, DiscoveryTrigger};
use super::scraper::DiscoveryNotifier;
use crate::ranking::{
    is_valid_user_pk, normalize, ContentEntryRow, ContentListing, ContentRow, EngineConfig,
    ExclusionList, RankingEngine, RankingKind, RawQuery, ResultAssembler, SkappRow, UserRow,
    DEFAULT_LISTING_SORT,
};
use crate::store::Stores;
use crate::types::Result;

/// User leaderboard response
#[derive(Debug, Clone)]
pub struct UserLeaderboard {
    pub rows: Vec<UserRow>,
    /// The filtered user was seen for the first time by this request
    pub newly_discovered: bool,
}

/// Serves the four leaderboard operations
#[derive(Clone)]
pub struct LeaderboardService {
    engine: RankingEngine,
    assembler: ResultAssembler,
    listing: ContentListing,
    discovery: DiscoveryTrigger,
    stores: Stores,
}

impl LeaderboardService {
    pub fn new(stores: Stores, notifier: Arc<dyn DiscoveryNotifier>, config: EngineConfig) -> Self {
        let listing = ContentListing::new(
            stores.events.clone(),
            stores.lists.clone(),
            config.actor_blocklist,
        );
        Self {
            engine: RankingEngine::new(stores.events.clone(), stores.lists.clone(), config),
            assembler: ResultAssembler::new(stores.identities.clone()),
            listing,
            discovery: DiscoveryTrigger::new(stores.identities.clone(), notifier),
            stores,
        }
    }

    /// Content leaderboard; discovery of the filtered user runs detached
    pub async fn content(&self, raw: &RawQuery) -> Result<Vec<ContentRow>> {
        let kind = RankingKind::Content;
        let request = normalize(raw, kind.default_sort_field())?;
        let page = self.engine.rank(kind, &request).await?;

        self.discover_detached(&request.filter_by_actor, &page.excluded_actors);
        Ok(page.rows.into_iter().map(ContentRow::from).collect())
    }

    /// Skapp leaderboard; discovery of the filtered user runs detached
    pub async fn skapps(&self, raw: &RawQuery) -> Result<Vec<SkappRow>> {
        let kind = RankingKind::Skapp;
        let request = normalize(raw, kind.default_sort_field())?;
        let page = self.engine.rank(kind, &request).await?;

        self.discover_detached(&request.filter_by_actor, &page.excluded_actors);
        Ok(page.rows.into_iter().map(SkappRow::from).collect())
    }

    /// User leaderboard
    ///
    /// The identity upsert is awaited so the response can report whether the
    /// filtered user was new, and so a placeholder row counts it.
    pub async fn users(&self, raw: &RawQuery) -> Result<UserLeaderboard> {
        let kind = RankingKind::User;
        let request = normalize(raw, kind.default_sort_field())?;
        let page = self.engine.rank(kind, &request).await?;

        let key = request.filter_by_actor.as_str();
        let outcome = if is_valid_user_pk(key) && !page.excluded_actors.contains(key) {
            self.discovery.try_discover(key).await
        } else {
            DiscoveryOutcome::NotAttempted
        };

        let rows = self.assembler.assemble_users(&request, page).await;
        Ok(UserLeaderboard {
            rows,
            newly_discovered: outcome == DiscoveryOutcome::NewlyDiscovered,
        })
    }

    /// Content produced by one user
    pub async fn user_content(&self, raw: &RawQuery) -> Result<Vec<ContentEntryRow>> {
        let request = normalize(raw, DEFAULT_LISTING_SORT)?;
        self.listing.list(&request).await
    }

    /// Whether the event store is reachable
    pub async fn ready(&self) -> Result<()> {
        self.stores.events.ping().await
    }

    fn discover_detached(&self, key: &str, excluded: &ExclusionList) {
        if !is_valid_user_pk(key) || excluded.contains(key) {
            return;
        }
        debug!(user_pk = %key, "Scheduling discovery");
        drop(self.discovery.spawn_discover(key.to_string()));
    }
}
