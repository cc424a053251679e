//! Entry document schema
//!
//! Activity events written by the scraper. Read-only from this service.

use bson::{oid::ObjectId, Bson, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::ranking::{Event, EventKind};

/// Collection name for entries
pub const ENTRY_COLLECTION: &str = "entries";

/// Entry document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct EntryDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Identifier of the root content this entry belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    /// Identifier of this entry
    #[serde(default)]
    pub identifier: String,

    /// `newcontent` or `interaction`
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(rename = "entryType", default)]
    pub entry_type: String,

    #[serde(rename = "userPK", default)]
    pub user_pk: String,

    #[serde(default)]
    pub skapp: String,

    #[serde(default)]
    pub skylink: String,

    #[serde(default)]
    pub metadata: Bson,

    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl EntryDoc {
    pub fn into_event(self) -> Event {
        Event {
            root_id: self.root.unwrap_or_default(),
            entry_id: self.identifier,
            kind: EventKind::from_type(&self.kind),
            entry_type: self.entry_type,
            app_name: self.skapp,
            actor_key: self.user_pk,
            link: self.skylink,
            created_at: self.created_at.map(|dt| dt.to_chrono()).unwrap_or_default(),
            metadata: self.metadata.into_relaxed_extjson(),
        }
    }
}

impl IntoIndexes for EntryDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        // Owned by the scraper; this service never changes its indexes
        vec![]
    }
}
