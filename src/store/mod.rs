//! Storage seams
//!
//! The engine, discovery and assembler only see these traits. Two backends
//! implement all three: [`MongoStore`] for production and [`MemoryStore`]
//! for tests and dev mode.

mod memory;
mod mongo;
pub mod pipeline;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::ranking::{Event, EventListQuery, GroupQuery, GroupStats, Identity, ListType};
use crate::types::Result;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Read access to recorded events
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Pre-filter, tag and group events; groups in any order
    async fn group_events(&self, query: &GroupQuery) -> Result<Vec<GroupStats>>;

    /// One actor's events, sorted and paginated
    async fn list_events(&self, query: &EventListQuery) -> Result<Vec<Event>>;

    /// Cheap reachability check for readiness probes
    async fn ping(&self) -> Result<()>;
}

/// Identity tracking records
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find(&self, key: &str) -> Result<Option<Identity>>;

    async fn find_many(&self, keys: &[String]) -> Result<Vec<Identity>>;

    /// Atomically create the record for `key` unless one exists.
    /// Returns `true` only for the call that created it.
    async fn insert_if_absent(&self, key: &str, now: DateTime<Utc>) -> Result<bool>;

    async fn count(&self) -> Result<u64>;
}

/// Allow/block lists
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Items of `list` in stored order; a missing list is empty
    async fn items(&self, list: ListType) -> Result<Vec<String>>;
}

/// The three store handles, usually backed by one object
#[derive(Clone)]
pub struct Stores {
    pub events: Arc<dyn EventStore>,
    pub identities: Arc<dyn IdentityStore>,
    pub lists: Arc<dyn ListStore>,
}

impl Stores {
    /// Use one backend for every store
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: EventStore + IdentityStore + ListStore + 'static,
    {
        Self {
            events: backend.clone(),
            identities: backend.clone(),
            lists: backend,
        }
    }
}
