//! Exclusion lists
//!
//! Lists are read fresh for every ranking request so a newly blocked key
//! disappears from the very next response.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::ListStore;
use crate::types::Result;

/// Category of a stored list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListType {
    SkappBlocklist,
    UserBlocklist,
}

impl ListType {
    /// Value of the `type` field in the `lists` collection
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkappBlocklist => "SKAPP_BLOCKLIST",
            Self::UserBlocklist => "USER_BLOCKLIST",
        }
    }
}

/// Snapshot of one list, in stored order
#[derive(Debug, Clone, Default)]
pub struct ExclusionList {
    items: Vec<String>,
    lookup: HashSet<String>,
}

impl ExclusionList {
    pub fn new(items: Vec<String>) -> Self {
        let lookup = items.iter().cloned().collect();
        Self { items, lookup }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lookup.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in stored order
    pub fn items(&self) -> &[String] {
        &self.items
    }
}

/// Reads exclusion lists from the list store
#[derive(Clone)]
pub struct ExclusionListProvider {
    lists: Arc<dyn ListStore>,
}

impl ExclusionListProvider {
    pub fn new(lists: Arc<dyn ListStore>) -> Self {
        Self { lists }
    }

    /// Current contents of `list`; a missing list is empty
    pub async fn fetch(&self, list: ListType) -> Result<ExclusionList> {
        let items = self.lists.items(list).await?;
        debug!(list = list.as_str(), items = items.len(), "Loaded exclusion list");
        Ok(ExclusionList::new(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_exclusion_list_lookup() {
        let list = ExclusionList::new(vec!["b".to_string(), "a".to_string()]);
        assert!(list.contains("a"));
        assert!(!list.contains("c"));
        assert_eq!(list.items(), &["b".to_string(), "a".to_string()]);
        assert!(ExclusionList::default().is_empty());
    }

    #[test]
    fn test_list_type_wire_name() {
        let json = serde_json::to_string(&ListType::UserBlocklist).unwrap();
        assert_eq!(json, "\"USER_BLOCKLIST\"");
        assert_eq!(ListType::SkappBlocklist.as_str(), "SKAPP_BLOCKLIST");
    }

    #[tokio::test]
    async fn test_fetch_is_fresh_per_call() {
        let store = Arc::new(MemoryStore::new());
        let provider = ExclusionListProvider::new(store.clone());

        assert!(provider.fetch(ListType::UserBlocklist).await.unwrap().is_empty());

        store.set_list(ListType::UserBlocklist, vec!["spammer".to_string()]);
        let list = provider.fetch(ListType::UserBlocklist).await.unwrap();
        assert!(list.contains("spammer"));
        assert!(provider.fetch(ListType::SkappBlocklist).await.unwrap().is_empty());
    }
}
