//! Ranking engine
//!
//! One pipeline for every leaderboard kind:
//!
//! ```text
//! validate sort field → load exclusions → pre-filter + group (store)
//!   → post-filter → sort → rank → skip/limit
//! ```
//!
//! Ranks are assigned over the complete filtered set before pagination, so
//! page two continues where page one stopped. Ties on the sort metric are
//! broken by descending grouping key, which makes repeated identical
//! requests return identical pages.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::aggregate::{EventPattern, GroupQuery};
use super::exclusion::{ExclusionList, ExclusionListProvider, ListType};
use super::kind::{FilterPlacement, Metric, RankingKind, RequestFilter};
use super::model::GroupStats;
use super::request::{RankingRequest, SortDirection};
use crate::store::{EventStore, ListStore};
use crate::types::{LeaderboardError, Result};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Lookback of the "recent" counters
    pub recent_window: Duration,
    /// List whose actors are removed from every leaderboard
    pub actor_blocklist: ListType,
    /// List whose apps are removed from the skapp leaderboard
    pub app_blocklist: ListType,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recent_window: Duration::hours(24),
            actor_blocklist: ListType::UserBlocklist,
            app_blocklist: ListType::SkappBlocklist,
        }
    }
}

/// A group with its assigned rank
#[derive(Debug, Clone, PartialEq)]
pub struct RankedGroup {
    pub rank: u64,
    pub stats: GroupStats,
}

/// One page of a leaderboard
#[derive(Debug, Clone)]
pub struct RankedPage {
    pub rows: Vec<RankedGroup>,
    /// Size of the complete ranked set, before pagination
    pub total_groups: usize,
    /// Actor blocklist the page was computed with
    pub excluded_actors: ExclusionList,
}

/// Computes ranked, paginated leaderboards from the event store
#[derive(Clone)]
pub struct RankingEngine {
    events: Arc<dyn EventStore>,
    exclusions: ExclusionListProvider,
    config: EngineConfig,
}

impl RankingEngine {
    pub fn new(events: Arc<dyn EventStore>, lists: Arc<dyn ListStore>, config: EngineConfig) -> Self {
        Self {
            events,
            exclusions: ExclusionListProvider::new(lists),
            config,
        }
    }

    /// Rank at the current instant
    pub async fn rank(&self, kind: RankingKind, request: &RankingRequest) -> Result<RankedPage> {
        self.rank_at(kind, request, Utc::now()).await
    }

    /// Rank with the recent window anchored at `now`
    pub async fn rank_at(
        &self,
        kind: RankingKind,
        request: &RankingRequest,
        now: DateTime<Utc>,
    ) -> Result<RankedPage> {
        // Reject before touching the store
        let metric = resolve_metric(kind, &request.sort_field)?;

        let excluded_actors = self.exclusions.fetch(self.config.actor_blocklist).await?;
        let excluded_apps = if kind.requires_app() {
            self.exclusions.fetch(self.config.app_blocklist).await?
        } else {
            ExclusionList::default()
        };

        let query = build_group_query(
            kind,
            request,
            &excluded_actors,
            &excluded_apps,
            now - self.config.recent_window,
        );
        let groups = self.events.group_events(&query).await?;
        let grouped = groups.len();

        let (rows, total_groups) = rank_groups(kind, request, metric, groups);

        debug!(
            kind = kind.as_str(),
            grouped,
            ranked = total_groups,
            returned = rows.len(),
            skip = request.skip,
            limit = request.limit,
            "Ranked leaderboard"
        );

        Ok(RankedPage {
            rows,
            total_groups,
            excluded_actors,
        })
    }
}

/// Resolve the request's sort field to a metric of `kind`
pub fn resolve_metric(kind: RankingKind, sort_field: &str) -> Result<Metric> {
    kind.metric(sort_field).ok_or_else(|| {
        LeaderboardError::invalid(format!(
            "param 'sortBy' must be one of {}, got '{}'",
            kind.metric_names().join(", "),
            sort_field
        ))
    })
}

/// Translate a request into the store-side grouping query
pub fn build_group_query(
    kind: RankingKind,
    request: &RankingRequest,
    excluded_actors: &ExclusionList,
    excluded_apps: &ExclusionList,
    recent_since: DateTime<Utc>,
) -> GroupQuery {
    let mut query = GroupQuery::new(kind, recent_since);
    query.excluded_actors = excluded_actors.items().to_vec();
    query.excluded_apps = excluded_apps.items().to_vec();

    for (filter, value) in request_filters(request) {
        if let FilterPlacement::Event(field) = kind.placement(filter) {
            query.patterns.push(EventPattern::new(field, value));
        }
    }

    query
}

fn request_filters(request: &RankingRequest) -> impl Iterator<Item = (RequestFilter, &str)> {
    [
        (RequestFilter::Entity, request.filter_by_entity.as_str()),
        (RequestFilter::App, request.filter_by_app.as_str()),
        (RequestFilter::Actor, request.filter_by_actor.as_str()),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
}

fn passes_post_filters(kind: RankingKind, request: &RankingRequest, group: &GroupStats) -> bool {
    request_filters(request).all(|(filter, value)| match kind.placement(filter) {
        FilterPlacement::Event(_) => true,
        FilterPlacement::GroupKey => group.key.contains(value),
        FilterPlacement::RepresentativeApp => group
            .representative
            .as_ref()
            .is_some_and(|rep| rep.app_name.contains(value)),
    })
}

/// Post-filter, sort, rank and paginate grouped stats
///
/// Returns the requested page and the size of the complete ranked set.
pub fn rank_groups(
    kind: RankingKind,
    request: &RankingRequest,
    metric: Metric,
    groups: Vec<GroupStats>,
) -> (Vec<RankedGroup>, usize) {
    let mut groups: Vec<GroupStats> = groups
        .into_iter()
        .filter(|group| passes_post_filters(kind, request, group))
        .collect();

    groups.sort_by(|a, b| compare_groups(metric, request.sort_direction, a, b));

    let total = groups.len();
    let rows = groups
        .into_iter()
        .enumerate()
        .skip(request.skip)
        .take(request.limit)
        .map(|(position, stats)| RankedGroup {
            rank: position as u64 + 1,
            stats,
        })
        .collect();

    (rows, total)
}

fn compare_groups(
    metric: Metric,
    direction: SortDirection,
    a: &GroupStats,
    b: &GroupStats,
) -> Ordering {
    let by_metric = metric.value(&a.counters).cmp(&metric.value(&b.counters));
    let by_metric = match direction {
        SortDirection::Asc => by_metric,
        SortDirection::Desc => by_metric.reverse(),
    };
    by_metric.then_with(|| b.key.cmp(&a.key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::model::{Counters, Event, Representative};
    use crate::store::MemoryStore;

    fn now() -> DateTime<Utc> {
        "2024-03-01T12:00:00Z".parse().unwrap()
    }

    fn group(key: &str, total: u64) -> GroupStats {
        GroupStats {
            key: key.to_string(),
            counters: Counters {
                total,
                ..Counters::default()
            },
            representative: None,
        }
    }

    fn keys(rows: &[RankedGroup]) -> Vec<&str> {
        rows.iter().map(|r| r.stats.key.as_str()).collect()
    }

    fn ranks(rows: &[RankedGroup]) -> Vec<u64> {
        rows.iter().map(|r| r.rank).collect()
    }

    #[test]
    fn test_ties_break_by_descending_key() {
        let request = RankingRequest::new("total");
        let groups = vec![group("a", 2), group("c", 2), group("b", 5), group("d", 1)];

        let (rows, total) = rank_groups(RankingKind::Skapp, &request, Metric::Total, groups);
        assert_eq!(total, 4);
        assert_eq!(keys(&rows), vec!["b", "c", "a", "d"]);
        assert_eq!(ranks(&rows), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_ascending_keeps_descending_key_tiebreak() {
        let mut request = RankingRequest::new("total");
        request.sort_direction = SortDirection::Asc;
        let groups = vec![group("a", 2), group("c", 2), group("b", 5)];

        let (rows, _) = rank_groups(RankingKind::Skapp, &request, Metric::Total, groups);
        assert_eq!(keys(&rows), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_ranks_continue_across_pages() {
        let groups: Vec<GroupStats> = (0..45).map(|i| group(&format!("g{:02}", i), i)).collect();
        let mut request = RankingRequest::new("total");
        request.skip = 20;
        request.limit = 10;

        let (rows, total) = rank_groups(RankingKind::Skapp, &request, Metric::Total, groups);
        assert_eq!(total, 45);
        assert_eq!(ranks(&rows), (21..=30).collect::<Vec<u64>>());
        assert_eq!(rows[0].stats.key, "g24");
    }

    #[test]
    fn test_skip_past_end_is_empty() {
        let mut request = RankingRequest::new("total");
        request.skip = 100;
        let (rows, total) =
            rank_groups(RankingKind::Skapp, &request, Metric::Total, vec![group("a", 1)]);
        assert!(rows.is_empty());
        assert_eq!(total, 1);
    }

    #[test]
    fn test_post_filters_apply_before_ranking() {
        let mut request = RankingRequest::new("total");
        request.filter_by_entity = "keep".to_string();
        let groups = vec![group("drop-1", 10), group("keep-1", 3), group("keep-2", 5)];

        let (rows, total) = rank_groups(RankingKind::Content, &request, Metric::Total, groups);
        assert_eq!(total, 2);
        assert_eq!(keys(&rows), vec!["keep-2", "keep-1"]);
        assert_eq!(ranks(&rows), vec![1, 2]);
    }

    #[test]
    fn test_representative_app_filter() {
        let mut request = RankingRequest::new("total");
        request.filter_by_app = "crqa".to_string();

        let mut with_app = group("a", 1);
        with_app.representative = Some(Representative {
            app_name: "crqa.hns".to_string(),
            link: String::new(),
            metadata: serde_json::Value::Null,
            creator: None,
        });
        let without_rep = group("b", 2);

        let (rows, _) = rank_groups(
            RankingKind::Content,
            &request,
            Metric::Total,
            vec![with_app, without_rep],
        );
        assert_eq!(keys(&rows), vec!["a"]);
    }

    #[test]
    fn test_group_query_places_event_filters() {
        let mut request = RankingRequest::new("total");
        request.filter_by_entity = "root".to_string();
        request.filter_by_app = "app".to_string();
        request.filter_by_actor = "actor".to_string();

        let blocked = ExclusionList::new(vec!["spam".to_string()]);
        let query = build_group_query(
            RankingKind::Skapp,
            &request,
            &blocked,
            &ExclusionList::default(),
            now(),
        );

        assert_eq!(query.excluded_actors, vec!["spam".to_string()]);
        // skapp filters the grouping key, so only the other two narrow events
        assert_eq!(query.patterns.len(), 2);
        assert!(query
            .patterns
            .iter()
            .all(|p| p.needle == "root" || p.needle == "actor"));
    }

    #[tokio::test]
    async fn test_unknown_sort_field_rejected_before_store_access() {
        let store = Arc::new(MemoryStore::new());
        let engine = RankingEngine::new(store.clone(), store.clone(), EngineConfig::default());

        let request = RankingRequest::new("createdAt");
        let err = engine
            .rank_at(RankingKind::Content, &request, now())
            .await
            .unwrap_err();

        assert!(matches!(err, LeaderboardError::InvalidParameter(_)));
        assert_eq!(store.access_count(), 0);
    }

    #[tokio::test]
    async fn test_entity_ranking_scenario() {
        let store = Arc::new(MemoryStore::new());
        store.insert_events(vec![
            Event::creation("a", "X", "u1", now()),
            Event::interaction("a", "a-1", "", "u2", now()),
        ]);
        let engine = RankingEngine::new(store.clone(), store.clone(), EngineConfig::default());

        let page = engine
            .rank_at(RankingKind::Content, &RankingRequest::new("total"), now())
            .await
            .unwrap();

        assert_eq!(page.total_groups, 1);
        let row = &page.rows[0];
        assert_eq!(row.rank, 1);
        assert_eq!(row.stats.key, "a");
        assert_eq!(row.stats.counters.total, 2);
        let rep = row.stats.representative.as_ref().unwrap();
        assert_eq!(rep.creator.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_blocked_actor_never_ranked() {
        let store = Arc::new(MemoryStore::new());
        store.insert_events(vec![
            Event::creation("a", "X", "spammer", now()),
            Event::creation("b", "X", "spammer", now()),
            Event::creation("c", "X", "u1", now()),
        ]);
        store.set_list(ListType::UserBlocklist, vec!["spammer".to_string()]);
        let engine = RankingEngine::new(store.clone(), store.clone(), EngineConfig::default());

        let page = engine
            .rank_at(RankingKind::User, &RankingRequest::new("newContentTotal"), now())
            .await
            .unwrap();

        assert_eq!(keys(&page.rows), vec!["u1"]);
        assert!(page.excluded_actors.contains("spammer"));
    }

    #[tokio::test]
    async fn test_blocked_app_removed_from_skapp_ranking() {
        let store = Arc::new(MemoryStore::new());
        store.insert_events(vec![
            Event::creation("a", "good", "u1", now()),
            Event::creation("b", "bad", "u1", now()),
        ]);
        store.set_list(ListType::SkappBlocklist, vec!["bad".to_string()]);
        let engine = RankingEngine::new(store.clone(), store.clone(), EngineConfig::default());

        let skapps = engine
            .rank_at(RankingKind::Skapp, &RankingRequest::new("total"), now())
            .await
            .unwrap();
        assert_eq!(keys(&skapps.rows), vec!["good"]);

        // The app blocklist only applies to the skapp leaderboard
        let content = engine
            .rank_at(RankingKind::Content, &RankingRequest::new("total"), now())
            .await
            .unwrap();
        assert_eq!(content.total_groups, 2);
    }

    #[tokio::test]
    async fn test_identical_requests_are_deterministic() {
        let store = Arc::new(MemoryStore::new());
        let events: Vec<Event> = (0..30)
            .map(|i| Event::creation(&format!("r{i}"), "X", &format!("u{}", i % 7), now()))
            .collect();
        store.insert_events(events);
        let engine = RankingEngine::new(store.clone(), store.clone(), EngineConfig::default());

        let mut request = RankingRequest::new("newContentTotal");
        request.limit = 5;
        let first = engine.rank_at(RankingKind::User, &request, now()).await.unwrap();
        let second = engine.rank_at(RankingKind::User, &request, now()).await.unwrap();
        assert_eq!(first.rows, second.rows);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let store = Arc::new(MemoryStore::new());
        store.set_unavailable(true);
        let engine = RankingEngine::new(store.clone(), store.clone(), EngineConfig::default());

        let err = engine
            .rank_at(RankingKind::Skapp, &RankingRequest::new("total"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, LeaderboardError::StoreUnavailable(_)));
    }
}
