//! Response row shapes for each leaderboard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::engine::RankedGroup;
use super::model::{Event, IdentityProfile, UNKNOWN_CREATOR};

/// Row of the content leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRow {
    pub identifier: String,
    pub skapp: String,
    pub creator: String,
    pub link: String,
    pub metadata: JsonValue,
    pub total: u64,
    #[serde(rename = "last24H")]
    pub last_24h: u64,
    pub rank: u64,
}

impl From<RankedGroup> for ContentRow {
    fn from(ranked: RankedGroup) -> Self {
        let RankedGroup { rank, stats } = ranked;
        let representative = stats.representative;
        let (skapp, link, metadata, creator) = match representative {
            Some(rep) => (rep.app_name, rep.link, rep.metadata, rep.creator),
            None => (String::new(), String::new(), JsonValue::Null, None),
        };

        Self {
            identifier: stats.key,
            skapp,
            creator: creator.unwrap_or_else(|| UNKNOWN_CREATOR.to_string()),
            link,
            metadata,
            total: stats.counters.total,
            last_24h: stats.counters.recent,
            rank,
        }
    }
}

/// Row of the skapp leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkappRow {
    pub skapp: String,
    pub total: u64,
    #[serde(rename = "last24H")]
    pub last_24h: u64,
    pub rank: u64,
}

impl From<RankedGroup> for SkappRow {
    fn from(ranked: RankedGroup) -> Self {
        Self {
            skapp: ranked.stats.key,
            total: ranked.stats.counters.total,
            last_24h: ranked.stats.counters.recent,
            rank: ranked.rank,
        }
    }
}

/// Row of the user leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    #[serde(rename = "userPK")]
    pub user_pk: String,
    #[serde(rename = "newContentTotal")]
    pub new_content_total: u64,
    #[serde(rename = "newContentLast24H")]
    pub new_content_last_24h: u64,
    #[serde(rename = "interactionsTotal")]
    pub interactions_total: u64,
    #[serde(rename = "interactionsLast24H")]
    pub interactions_last_24h: u64,
    pub rank: u64,
    #[serde(rename = "userMetadata", default)]
    pub user_metadata: IdentityProfile,
}

impl UserRow {
    /// Zero-counter row for an identity without any recorded events
    pub fn placeholder(user_pk: &str, rank: u64, user_metadata: IdentityProfile) -> Self {
        Self {
            user_pk: user_pk.to_string(),
            new_content_total: 0,
            new_content_last_24h: 0,
            interactions_total: 0,
            interactions_last_24h: 0,
            rank,
            user_metadata,
        }
    }
}

impl From<RankedGroup> for UserRow {
    fn from(ranked: RankedGroup) -> Self {
        let counters = ranked.stats.counters;
        Self {
            user_pk: ranked.stats.key,
            new_content_total: counters.creation_total,
            new_content_last_24h: counters.creation_recent,
            interactions_total: counters.interaction_total,
            interactions_last_24h: counters.interaction_recent,
            rank: ranked.rank,
            user_metadata: IdentityProfile::default(),
        }
    }
}

/// Row of an actor's content listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntryRow {
    #[serde(rename = "entryType")]
    pub entry_type: String,
    #[serde(rename = "userPK")]
    pub user_pk: String,
    pub skapp: String,
    pub identifier: String,
    pub metadata: JsonValue,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<Event> for ContentEntryRow {
    fn from(event: Event) -> Self {
        Self {
            entry_type: event.entry_type,
            user_pk: event.actor_key,
            skapp: event.app_name,
            identifier: event.entry_id,
            metadata: event.metadata,
            created_at: event.created_at,
        }
    }
}
