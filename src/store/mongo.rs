//! MongoDB-backed store

use async_trait::async_trait;
use bson::{doc, Bson};
use chrono::{DateTime, Utc};
use mongodb::options::FindOptions;
use tracing::{debug, error, info};

use super::pipeline::{decode_group, group_pipeline, listing_filter, listing_sort};
use super::{EventStore, IdentityStore, ListStore};
use crate::db::schemas::{EntryDoc, ListDoc, UserDoc, ENTRY_COLLECTION, LIST_COLLECTION, USER_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::ranking::{Event, EventListQuery, GroupQuery, GroupStats, Identity, ListType};
use crate::types::Result;

/// Store over the `entries`, `users` and `lists` collections
#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    entries: MongoCollection<EntryDoc>,
    users: MongoCollection<UserDoc>,
    lists: MongoCollection<ListDoc>,
    /// Log every aggregation pipeline at info instead of debug
    debug_pipeline: bool,
}

impl MongoStore {
    pub async fn new(client: MongoClient, debug_pipeline: bool) -> Result<Self> {
        let entries = client.collection::<EntryDoc>(ENTRY_COLLECTION).await?;
        let users = client.collection::<UserDoc>(USER_COLLECTION).await?;
        let lists = client.collection::<ListDoc>(LIST_COLLECTION).await?;

        Ok(Self {
            client,
            entries,
            users,
            lists,
            debug_pipeline,
        })
    }
}

#[async_trait]
impl EventStore for MongoStore {
    async fn group_events(&self, query: &GroupQuery) -> Result<Vec<GroupStats>> {
        let pipeline = group_pipeline(query);

        let rendered = Bson::Array(pipeline.iter().cloned().map(Bson::Document).collect())
            .into_relaxed_extjson();
        if self.debug_pipeline {
            info!(kind = query.kind.as_str(), pipeline = %rendered, "Aggregation pipeline");
        } else {
            debug!(kind = query.kind.as_str(), pipeline = %rendered, "Aggregation pipeline");
        }

        let documents = self.entries.aggregate(pipeline).await.map_err(|e| {
            error!(kind = query.kind.as_str(), error = %e, "Aggregation failed");
            e
        })?;

        let has_representative = query.kind.has_representative();
        documents
            .iter()
            .map(|document| decode_group(document, has_representative))
            .collect()
    }

    async fn list_events(&self, query: &EventListQuery) -> Result<Vec<Event>> {
        let options = FindOptions::builder()
            .sort(listing_sort(query))
            .skip(query.skip as u64)
            .limit(query.limit as i64)
            .build();

        let entries = self
            .entries
            .find_many(listing_filter(query), Some(options))
            .await
            .map_err(|e| {
                error!(user_pk = %query.actor_key, error = %e, "Listing query failed");
                e
            })?;

        Ok(entries.into_iter().map(EntryDoc::into_event).collect())
    }

    async fn ping(&self) -> Result<()> {
        self.client.ping().await
    }
}

#[async_trait]
impl IdentityStore for MongoStore {
    async fn find(&self, key: &str) -> Result<Option<Identity>> {
        let user = self.users.find_one(doc! { "userPK": key }).await?;
        Ok(user.map(UserDoc::into_identity))
    }

    async fn find_many(&self, keys: &[String]) -> Result<Vec<Identity>> {
        let users = self
            .users
            .find_many(doc! { "userPK": { "$in": keys.to_vec() } }, None)
            .await?;
        Ok(users.into_iter().map(UserDoc::into_identity).collect())
    }

    async fn insert_if_absent(&self, key: &str, now: DateTime<Utc>) -> Result<bool> {
        self.users
            .insert_if_absent(doc! { "userPK": key }, UserDoc::seed(key, now))
            .await
    }

    async fn count(&self) -> Result<u64> {
        self.users.count(doc! {}).await
    }
}

#[async_trait]
impl ListStore for MongoStore {
    async fn items(&self, list: ListType) -> Result<Vec<String>> {
        let found = self.lists.find_one(doc! { "type": list.as_str() }).await?;
        Ok(found.map(|doc| doc.items).unwrap_or_default())
    }
}
