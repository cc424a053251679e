//! In-memory store
//!
//! Evaluates queries with the same functions the engine's tests pin down,
//! so it doubles as the reference backend.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{EventStore, IdentityStore, ListStore};
use crate::ranking::{
    group_events, select_events, Event, EventListQuery, GroupQuery, GroupStats, Identity, ListType,
};
use crate::types::{LeaderboardError, Result};

/// Store backed by process memory
#[derive(Default)]
pub struct MemoryStore {
    events: RwLock<Vec<Event>>,
    identities: DashMap<String, Identity>,
    lists: DashMap<ListType, Vec<String>>,
    unavailable: AtomicBool,
    accesses: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_events(&self, events: impl IntoIterator<Item = Event>) {
        if let Ok(mut stored) = self.events.write() {
            stored.extend(events);
        }
    }

    pub fn set_list(&self, list: ListType, items: Vec<String>) {
        self.lists.insert(list, items);
    }

    pub fn insert_identity(&self, identity: Identity) {
        self.identities.insert(identity.user_pk.clone(), identity);
    }

    pub fn identity_count(&self) -> usize {
        self.identities.len()
    }

    /// Make every store call fail with `StoreUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of store calls made so far
    pub fn access_count(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LeaderboardError::StoreUnavailable(
                "memory store marked unavailable".into(),
            ));
        }
        Ok(())
    }

    fn read_events(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Event>>> {
        self.events
            .read()
            .map_err(|_| LeaderboardError::Internal("event lock poisoned".into()))
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn group_events(&self, query: &GroupQuery) -> Result<Vec<GroupStats>> {
        self.check()?;
        let events = self.read_events()?;
        Ok(group_events(events.iter(), query))
    }

    async fn list_events(&self, query: &EventListQuery) -> Result<Vec<Event>> {
        self.check()?;
        let events = self.read_events()?;
        Ok(select_events(events.iter(), query))
    }

    async fn ping(&self) -> Result<()> {
        self.check()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find(&self, key: &str) -> Result<Option<Identity>> {
        self.check()?;
        Ok(self.identities.get(key).map(|entry| entry.value().clone()))
    }

    async fn find_many(&self, keys: &[String]) -> Result<Vec<Identity>> {
        self.check()?;
        Ok(keys
            .iter()
            .filter_map(|key| self.identities.get(key).map(|entry| entry.value().clone()))
            .collect())
    }

    async fn insert_if_absent(&self, key: &str, now: DateTime<Utc>) -> Result<bool> {
        self.check()?;
        match self.identities.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(Identity::discovered(key, now));
                Ok(true)
            }
        }
    }

    async fn count(&self) -> Result<u64> {
        self.check()?;
        Ok(self.identities.len() as u64)
    }
}

#[async_trait]
impl ListStore for MemoryStore {
    async fn items(&self, list: ListType) -> Result<Vec<String>> {
        self.check()?;
        Ok(self
            .lists
            .get(&list)
            .map(|items| items.value().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_insert_if_absent_reports_creation_once() {
        let store = MemoryStore::new();
        let now = Utc::now();

        assert!(store.insert_if_absent("k", now).await.unwrap());
        assert!(!store.insert_if_absent("k", now).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);

        let identity = store.find("k").await.unwrap().unwrap();
        assert_eq!(identity.discovered_at, Some(now));
    }

    #[tokio::test]
    async fn test_concurrent_inserts_create_one_identity() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.insert_if_absent("k", now).await.unwrap() })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.identity_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_and_counts_access() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.items(ListType::UserBlocklist).await,
            Err(LeaderboardError::StoreUnavailable(_))
        ));
        assert!(store.ping().await.is_err());
        assert_eq!(store.access_count(), 2);
    }
}
