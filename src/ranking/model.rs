//! Domain model shared by the engine and the stores
//!
//! Events are read-only activity records; identities are the per-actor
//! tracking records the discovery trigger creates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Creator attributed to an entity without a creation event
pub const UNKNOWN_CREATOR: &str = "unknown";

/// Length of a well-formed actor key
pub const USER_PK_LENGTH: usize = 64;

/// Whether `key` is a well-formed actor key: exactly 64 of `[a-z0-9]`
pub fn is_valid_user_pk(key: &str) -> bool {
    key.len() == USER_PK_LENGTH
        && key
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// Kind of recorded event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// The event that introduced a root entity
    #[serde(rename = "newcontent")]
    Creation,
    /// An interaction referencing an existing root entity
    #[serde(rename = "interaction")]
    Interaction,
    /// Any other type value found in the store; counted in totals only
    #[serde(other)]
    Other,
}

impl EventKind {
    /// Wire value stored in the `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creation => "newcontent",
            Self::Interaction => "interaction",
            Self::Other => "other",
        }
    }

    /// Parse a stored `type` value
    pub fn from_type(value: &str) -> Self {
        match value {
            "newcontent" => Self::Creation,
            "interaction" => Self::Interaction,
            _ => Self::Other,
        }
    }
}

/// One recorded activity event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Id of the root entity this event is about
    pub root_id: String,
    /// Unique id of this event; equals `root_id` for the creation event
    pub entry_id: String,
    pub kind: EventKind,
    /// Producer-specific entry type (post, comment, ...)
    #[serde(default)]
    pub entry_type: String,
    pub app_name: String,
    /// Identity that produced the event
    pub actor_key: String,
    /// Content link of the entity
    #[serde(default)]
    pub link: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: JsonValue,
}

impl Event {
    /// Creation event introducing `root_id`
    pub fn creation(root_id: &str, app_name: &str, actor_key: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            root_id: root_id.to_string(),
            entry_id: root_id.to_string(),
            kind: EventKind::Creation,
            entry_type: String::new(),
            app_name: app_name.to_string(),
            actor_key: actor_key.to_string(),
            link: String::new(),
            created_at,
            metadata: JsonValue::Null,
        }
    }

    /// Interaction event `entry_id` referencing `root_id`
    pub fn interaction(
        root_id: &str,
        entry_id: &str,
        app_name: &str,
        actor_key: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            root_id: root_id.to_string(),
            entry_id: entry_id.to_string(),
            kind: EventKind::Interaction,
            entry_type: String::new(),
            app_name: app_name.to_string(),
            actor_key: actor_key.to_string(),
            link: String::new(),
            created_at,
            metadata: JsonValue::Null,
        }
    }

    pub fn with_link(mut self, link: &str) -> Self {
        self.link = link.to_string();
        self
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_entry_type(mut self, entry_type: &str) -> Self {
        self.entry_type = entry_type.to_string();
        self
    }
}

/// Event field that filters and groupings can address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    RootId,
    AppName,
    ActorKey,
}

impl EventField {
    /// Value of this field on an event
    pub fn value<'a>(&self, event: &'a Event) -> &'a str {
        match self {
            Self::RootId => &event.root_id,
            Self::AppName => &event.app_name,
            Self::ActorKey => &event.actor_key,
        }
    }

    /// Field name in the `entries` collection
    pub fn column(&self) -> &'static str {
        match self {
            Self::RootId => "root",
            Self::AppName => "skapp",
            Self::ActorKey => "userPK",
        }
    }
}

/// Per-group counters
///
/// Every counter is an independent conditional sum, so a group without
/// creation events still reports zero creations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub total: u64,
    pub recent: u64,
    pub creation_total: u64,
    pub creation_recent: u64,
    pub interaction_total: u64,
    pub interaction_recent: u64,
}

impl Counters {
    /// Count one event of `kind`
    pub fn record(&mut self, kind: EventKind, recent: bool) {
        self.total += 1;
        if recent {
            self.recent += 1;
        }
        match kind {
            EventKind::Creation => {
                self.creation_total += 1;
                if recent {
                    self.creation_recent += 1;
                }
            }
            EventKind::Interaction => {
                self.interaction_total += 1;
                if recent {
                    self.interaction_recent += 1;
                }
            }
            EventKind::Other => {}
        }
    }
}

/// Representative fields of an entity group
#[derive(Debug, Clone, PartialEq)]
pub struct Representative {
    pub app_name: String,
    pub link: String,
    pub metadata: JsonValue,
    /// Actor of the representative creation event, if the group has one
    pub creator: Option<String>,
}

/// One aggregated group as returned by an event store
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub key: String,
    pub counters: Counters,
    /// Only populated for entity groupings
    pub representative: Option<Representative>,
}

/// Profile metadata attached to user rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityProfile {
    #[serde(rename = "mySkyProfile", skip_serializing_if = "Option::is_none")]
    pub my_sky_profile: Option<JsonValue>,
    #[serde(rename = "skyIDProfile", skip_serializing_if = "Option::is_none")]
    pub sky_id_profile: Option<JsonValue>,
}

/// Tracking record for one actor
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_pk: String,
    pub skapps: Vec<String>,
    pub profile: IdentityProfile,
    pub created_at: DateTime<Utc>,
    pub discovered_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Fresh record created by discovery
    pub fn discovered(user_pk: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_pk: user_pk.to_string(),
            skapps: Vec::new(),
            profile: IdentityProfile::default(),
            created_at: now,
            discovered_at: Some(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_wire_values() {
        assert_eq!(EventKind::from_type("newcontent"), EventKind::Creation);
        assert_eq!(EventKind::from_type("interaction"), EventKind::Interaction);
        assert_eq!(EventKind::from_type("post"), EventKind::Other);

        let kind: EventKind = serde_json::from_str("\"comment\"").unwrap();
        assert_eq!(kind, EventKind::Other);
    }

    #[test]
    fn test_counters_split_by_kind() {
        let mut counters = Counters::default();
        counters.record(EventKind::Interaction, true);
        counters.record(EventKind::Interaction, false);
        counters.record(EventKind::Other, true);

        assert_eq!(counters.total, 3);
        assert_eq!(counters.recent, 2);
        assert_eq!(counters.creation_total, 0);
        assert_eq!(counters.creation_recent, 0);
        assert_eq!(counters.interaction_total, 2);
        assert_eq!(counters.interaction_recent, 1);
    }

    #[test]
    fn test_creation_event_is_its_own_root() {
        let event = Event::creation("abc", "app", "u1", Utc::now());
        assert_eq!(event.entry_id, event.root_id);
    }

    #[test]
    fn test_user_pk_shape() {
        let valid = "a1".repeat(32);
        assert!(is_valid_user_pk(&valid));
        assert!(!is_valid_user_pk(&valid[..63]));
        assert!(!is_valid_user_pk(&format!("{valid}0")));
        assert!(!is_valid_user_pk(&valid.to_uppercase()));
        assert!(!is_valid_user_pk(&format!("{}-", &valid[..63])));
        assert!(!is_valid_user_pk(""));
    }

    #[test]
    fn test_profile_omits_missing_fields() {
        let profile = IdentityProfile::default();
        assert_eq!(serde_json::to_string(&profile).unwrap(), "{}");
    }
}
