//! Leaderboard kinds and their metric sets

use super::model::{Counters, EventField};

/// The three leaderboards: grouping by entity, application or actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankingKind {
    Content,
    Skapp,
    User,
}

/// A sortable per-group counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Total,
    Recent,
    CreationTotal,
    CreationRecent,
    InteractionTotal,
    InteractionRecent,
}

impl Metric {
    /// Read this metric from a group's counters
    pub fn value(&self, counters: &Counters) -> u64 {
        match self {
            Self::Total => counters.total,
            Self::Recent => counters.recent,
            Self::CreationTotal => counters.creation_total,
            Self::CreationRecent => counters.creation_recent,
            Self::InteractionTotal => counters.interaction_total,
            Self::InteractionRecent => counters.interaction_recent,
        }
    }
}

/// Which request filter is being placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFilter {
    Entity,
    App,
    Actor,
}

/// Where a request filter is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPlacement {
    /// On a raw event field, before grouping
    Event(EventField),
    /// On the grouping key, after grouping
    GroupKey,
    /// On the representative app name of an entity group, after grouping
    RepresentativeApp,
}

impl RankingKind {
    /// Event field the leaderboard groups by
    pub fn group_field(&self) -> EventField {
        match self {
            Self::Content => EventField::RootId,
            Self::Skapp => EventField::AppName,
            Self::User => EventField::ActorKey,
        }
    }

    /// Sort field used when the request names none
    pub fn default_sort_field(&self) -> &'static str {
        match self {
            Self::Content | Self::Skapp => "total",
            Self::User => "newContentTotal",
        }
    }

    /// Resolve a requested sort field against this kind's metric set
    pub fn metric(&self, field: &str) -> Option<Metric> {
        match (self, field) {
            (Self::Content | Self::Skapp, "total") => Some(Metric::Total),
            (Self::Content | Self::Skapp, "last24H") => Some(Metric::Recent),
            (Self::User, "newContentTotal") => Some(Metric::CreationTotal),
            (Self::User, "newContentLast24H") => Some(Metric::CreationRecent),
            (Self::User, "interactionsTotal") => Some(Metric::InteractionTotal),
            (Self::User, "interactionsLast24H") => Some(Metric::InteractionRecent),
            _ => None,
        }
    }

    /// Sort fields accepted by this kind, for error messages
    pub fn metric_names(&self) -> &'static [&'static str] {
        match self {
            Self::Content | Self::Skapp => &["total", "last24H"],
            Self::User => &[
                "newContentTotal",
                "newContentLast24H",
                "interactionsTotal",
                "interactionsLast24H",
            ],
        }
    }

    /// Whether events must reference a root entity
    pub fn requires_root(&self) -> bool {
        matches!(self, Self::Content | Self::Skapp)
    }

    /// Whether events must carry an app name
    pub fn requires_app(&self) -> bool {
        matches!(self, Self::Skapp)
    }

    /// Whether groups carry representative entity fields
    pub fn has_representative(&self) -> bool {
        matches!(self, Self::Content)
    }

    /// Where `filter` is evaluated for this kind
    ///
    /// A filter on the grouping key, or on the representative app of an
    /// entity, runs after grouping. Any other filter narrows the events.
    pub fn placement(&self, filter: RequestFilter) -> FilterPlacement {
        match (self, filter) {
            (Self::Content, RequestFilter::Entity)
            | (Self::Skapp, RequestFilter::App)
            | (Self::User, RequestFilter::Actor) => FilterPlacement::GroupKey,
            (Self::Content, RequestFilter::App) => FilterPlacement::RepresentativeApp,
            (_, RequestFilter::Entity) => FilterPlacement::Event(EventField::RootId),
            (_, RequestFilter::App) => FilterPlacement::Event(EventField::AppName),
            (_, RequestFilter::Actor) => FilterPlacement::Event(EventField::ActorKey),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Skapp => "skapps",
            Self::User => "users",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sort_field_is_a_metric() {
        for kind in [RankingKind::Content, RankingKind::Skapp, RankingKind::User] {
            assert!(kind.metric(kind.default_sort_field()).is_some());
            for name in kind.metric_names() {
                assert!(kind.metric(name).is_some(), "{name} for {}", kind.as_str());
            }
        }
    }

    #[test]
    fn test_metrics_are_kind_specific() {
        assert_eq!(RankingKind::Content.metric("newContentTotal"), None);
        assert_eq!(RankingKind::User.metric("total"), None);
        assert_eq!(RankingKind::Skapp.metric("createdAt"), None);
    }

    #[test]
    fn test_filter_placement() {
        assert_eq!(
            RankingKind::Content.placement(RequestFilter::Entity),
            FilterPlacement::GroupKey
        );
        assert_eq!(
            RankingKind::Content.placement(RequestFilter::App),
            FilterPlacement::RepresentativeApp
        );
        assert_eq!(
            RankingKind::Content.placement(RequestFilter::Actor),
            FilterPlacement::Event(EventField::ActorKey)
        );
        assert_eq!(
            RankingKind::Skapp.placement(RequestFilter::Entity),
            FilterPlacement::Event(EventField::RootId)
        );
        assert_eq!(
            RankingKind::User.placement(RequestFilter::App),
            FilterPlacement::Event(EventField::AppName)
        );
        assert_eq!(
            RankingKind::User.placement(RequestFilter::Actor),
            FilterPlacement::GroupKey
        );
    }
}
