//! Event grouping
//!
//! [`GroupQuery`] describes the pre-filter and grouping step of a ranking.
//! Stores either evaluate it natively (the MongoDB pipeline) or hand their
//! events to [`group_events`], which is the reference semantics.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::kind::RankingKind;
use super::model::{Counters, Event, EventField, EventKind, GroupStats, Representative};

/// Case-sensitive literal substring match on an event field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPattern {
    pub field: EventField,
    pub needle: String,
}

impl EventPattern {
    pub fn new(field: EventField, needle: &str) -> Self {
        Self {
            field,
            needle: needle.to_string(),
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.field.value(event).contains(self.needle.as_str())
    }
}

/// Pre-filter and grouping parameters of one ranking
#[derive(Debug, Clone)]
pub struct GroupQuery {
    pub kind: RankingKind,
    /// Actors whose events are dropped
    pub excluded_actors: Vec<String>,
    /// Apps whose events are dropped (application ranking only)
    pub excluded_apps: Vec<String>,
    /// Additional event-level filters
    pub patterns: Vec<EventPattern>,
    /// Events at or after this instant count as recent
    pub recent_since: DateTime<Utc>,
}

impl GroupQuery {
    /// Query with no exclusions or patterns
    pub fn new(kind: RankingKind, recent_since: DateTime<Utc>) -> Self {
        Self {
            kind,
            excluded_actors: Vec::new(),
            excluded_apps: Vec::new(),
            patterns: Vec::new(),
            recent_since,
        }
    }

    /// Whether `event` survives the pre-filter
    pub fn admits(&self, event: &Event) -> bool {
        if self.kind.requires_root() && event.root_id.is_empty() {
            return false;
        }
        if self.kind.requires_app() && event.app_name.is_empty() {
            return false;
        }
        if self.kind.group_field().value(event).is_empty() {
            return false;
        }
        if self.excluded_actors.iter().any(|a| *a == event.actor_key) {
            return false;
        }
        if self.excluded_apps.iter().any(|a| *a == event.app_name) {
            return false;
        }
        self.patterns.iter().all(|p| p.matches(event))
    }

    pub fn is_recent(&self, event: &Event) -> bool {
        event.created_at >= self.recent_since
    }
}

/// Precedence when picking an entity's representative event:
/// creation events first, then newest, then highest entry id.
fn representative_order(a: &Event, b: &Event) -> Ordering {
    let a_creation = a.kind == EventKind::Creation;
    let b_creation = b.kind == EventKind::Creation;
    a_creation
        .cmp(&b_creation)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.entry_id.cmp(&b.entry_id))
}

struct GroupAccumulator<'a> {
    counters: Counters,
    representative: Option<&'a Event>,
}

/// Filter and group events; groups come back ordered by key
pub fn group_events<'a, I>(events: I, query: &GroupQuery) -> Vec<GroupStats>
where
    I: IntoIterator<Item = &'a Event>,
{
    let group_field = query.kind.group_field();
    let keep_representative = query.kind.has_representative();
    let mut groups: BTreeMap<&'a str, GroupAccumulator<'a>> = BTreeMap::new();

    for event in events {
        if !query.admits(event) {
            continue;
        }

        let acc = groups
            .entry(group_field.value(event))
            .or_insert_with(|| GroupAccumulator {
                counters: Counters::default(),
                representative: None,
            });
        acc.counters.record(event.kind, query.is_recent(event));

        if keep_representative {
            let replace = match acc.representative {
                None => true,
                Some(current) => representative_order(event, current) == Ordering::Greater,
            };
            if replace {
                acc.representative = Some(event);
            }
        }
    }

    groups
        .into_iter()
        .map(|(key, acc)| GroupStats {
            key: key.to_string(),
            counters: acc.counters,
            representative: acc.representative.map(|event| Representative {
                app_name: event.app_name.clone(),
                link: event.link.clone(),
                metadata: event.metadata.clone(),
                creator: (event.kind == EventKind::Creation).then(|| event.actor_key.clone()),
            }),
        })
        .collect()
}
