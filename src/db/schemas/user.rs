//! User document schema
//!
//! Tracking record for a discovered user and the scraper's progress.

use bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use chrono::Utc;
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::ranking::{Identity, IdentityProfile};

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// User public key (64 lowercase alphanumerics)
    #[serde(rename = "userPK")]
    pub user_pk: String,

    /// Apps the scraper found entries for
    #[serde(default)]
    pub skapps: Vec<String>,

    /// Scraper paging state, keyed by skapp once the scraper has run
    #[serde(rename = "newContentCurrPage", skip_serializing_if = "Option::is_none")]
    pub new_content_curr_page: Option<Bson>,

    #[serde(rename = "newContentCurrNumEntries", skip_serializing_if = "Option::is_none")]
    pub new_content_curr_num_entries: Option<Bson>,

    #[serde(rename = "contentInteractionsCurrPage", skip_serializing_if = "Option::is_none")]
    pub content_interactions_curr_page: Option<Bson>,

    #[serde(rename = "contentInteractionsNumEntries", skip_serializing_if = "Option::is_none")]
    pub content_interactions_num_entries: Option<Bson>,

    #[serde(rename = "mySkyProfile", skip_serializing_if = "Option::is_none")]
    pub my_sky_profile: Option<Bson>,

    #[serde(rename = "skyIDProfile", skip_serializing_if = "Option::is_none")]
    pub sky_id_profile: Option<Bson>,

    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    #[serde(rename = "discoveredAt", skip_serializing_if = "Option::is_none")]
    pub discovered_at: Option<DateTime>,
}

impl UserDoc {
    /// Fields written when discovery creates the record
    pub fn seed(user_pk: &str, now: chrono::DateTime<Utc>) -> Document {
        let now = DateTime::from_chrono(now);
        doc! {
            "userPK": user_pk,
            "skapps": [],
            "newContentCurrPage": 0_i32,
            "newContentCurrNumEntries": 0_i32,
            "contentInteractionsCurrPage": 0_i32,
            "contentInteractionsNumEntries": 0_i32,
            "createdAt": now,
            "discoveredAt": now,
        }
    }

    pub fn into_identity(self) -> Identity {
        Identity {
            user_pk: self.user_pk,
            skapps: self.skapps,
            profile: IdentityProfile {
                my_sky_profile: self.my_sky_profile.map(Bson::into_relaxed_extjson),
                sky_id_profile: self.sky_id_profile.map(Bson::into_relaxed_extjson),
            },
            created_at: self.created_at.map(|dt| dt.to_chrono()).unwrap_or_default(),
            discovered_at: self.discovered_at.map(|dt| dt.to_chrono()),
        }
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Backs the insert-if-absent of discovery
            (
                doc! { "userPK": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("userPK_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_zeroes_progress_counters() {
        let now = Utc::now();
        let seed = UserDoc::seed("pk", now);
        assert_eq!(seed.get_str("userPK").unwrap(), "pk");
        assert_eq!(seed.get_i32("newContentCurrPage").unwrap(), 0);
        assert_eq!(seed.get_i32("contentInteractionsNumEntries").unwrap(), 0);
        assert!(seed.get_array("skapps").unwrap().is_empty());
        assert_eq!(seed.get_datetime("createdAt").unwrap(), seed.get_datetime("discoveredAt").unwrap());

        let decoded: UserDoc = bson::from_document(seed).unwrap();
        let identity = decoded.into_identity();
        assert_eq!(identity.user_pk, "pk");
        assert!(identity.discovered_at.is_some());
        assert_eq!(identity.profile, IdentityProfile::default());
    }

    #[test]
    fn test_profile_fields_carry_through() {
        let stored = doc! {
            "userPK": "pk",
            "mySkyProfile": { "username": "alice" },
        };
        let identity = bson::from_document::<UserDoc>(stored).unwrap().into_identity();
        assert_eq!(
            identity.profile.my_sky_profile,
            Some(serde_json::json!({ "username": "alice" }))
        );
        assert_eq!(identity.profile.sky_id_profile, None);
    }

    #[test]
    fn test_scraped_user_decodes_with_per_skapp_progress() {
        let stored = doc! {
            "userPK": "a".repeat(64),
            "skapps": ["crqa.hns", "skyfeed.hns"],
            "newContentCurrPage": { "crqa.hns": 2_i32, "skyfeed.hns": 0_i32 },
            "newContentCurrNumEntries": { "crqa.hns": 14_i32 },
            "contentInteractionsCurrPage": { "crqa.hns": 1_i32 },
            "contentInteractionsNumEntries": { "crqa.hns": 3_i32 },
            "mySkyProfile": { "username": "alice" },
            "skyIDProfile": { "dashboard": "x" },
        };

        let identity = bson::from_document::<UserDoc>(stored).unwrap().into_identity();
        assert_eq!(identity.skapps, vec!["crqa.hns", "skyfeed.hns"]);
        assert_eq!(
            identity.profile.my_sky_profile,
            Some(serde_json::json!({ "username": "alice" }))
        );
        assert_eq!(
            identity.profile.sky_id_profile,
            Some(serde_json::json!({ "dashboard": "x" }))
        );
    }
}
