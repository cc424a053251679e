//! Content listing for a single actor

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use super::exclusion::{ExclusionListProvider, ListType};
use super::model::{is_valid_user_pk, Event};
use super::request::{RankingRequest, SortDirection};
use super::rows::ContentEntryRow;
use crate::store::{EventStore, ListStore};
use crate::types::{LeaderboardError, Result};

/// Default sort field of the listing
pub const DEFAULT_LISTING_SORT: &str = "createdAt";

/// Sortable event field of the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingField {
    CreatedAt,
    Skapp,
    Identifier,
    EntryType,
}

impl ListingField {
    pub fn parse(field: &str) -> Option<Self> {
        match field {
            "createdAt" => Some(Self::CreatedAt),
            "skapp" => Some(Self::Skapp),
            "identifier" => Some(Self::Identifier),
            "entryType" => Some(Self::EntryType),
            _ => None,
        }
    }

    /// Field name in the `entries` collection
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::Skapp => "skapp",
            Self::Identifier => "identifier",
            Self::EntryType => "entryType",
        }
    }

    fn compare(&self, a: &Event, b: &Event) -> Ordering {
        match self {
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::Skapp => a.app_name.cmp(&b.app_name),
            Self::Identifier => a.entry_id.cmp(&b.entry_id),
            Self::EntryType => a.entry_type.cmp(&b.entry_type),
        }
    }
}

/// Store query for one actor's events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventListQuery {
    pub actor_key: String,
    pub sort_field: ListingField,
    pub sort_direction: SortDirection,
    pub skip: usize,
    pub limit: usize,
}

impl EventListQuery {
    /// Events of the actor that belong to some root entity
    pub fn admits(&self, event: &Event) -> bool {
        event.actor_key == self.actor_key && !event.root_id.is_empty()
    }

    /// Order on the sort field, ties by descending entry id
    pub fn compare(&self, a: &Event, b: &Event) -> Ordering {
        let ordering = self.sort_field.compare(a, b);
        let ordering = match self.sort_direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        ordering.then_with(|| b.entry_id.cmp(&a.entry_id))
    }
}

/// Filter, sort and paginate events in memory
pub fn select_events<'a, I>(events: I, query: &EventListQuery) -> Vec<Event>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut selected: Vec<&Event> = events.into_iter().filter(|e| query.admits(e)).collect();
    selected.sort_by(|a, b| query.compare(a, b));
    selected
        .into_iter()
        .skip(query.skip)
        .take(query.limit)
        .cloned()
        .collect()
}

/// Lists the content produced by one actor
#[derive(Clone)]
pub struct ContentListing {
    events: Arc<dyn EventStore>,
    exclusions: ExclusionListProvider,
    actor_blocklist: ListType,
}

impl ContentListing {
    pub fn new(events: Arc<dyn EventStore>, lists: Arc<dyn ListStore>, actor_blocklist: ListType) -> Self {
        Self {
            events,
            exclusions: ExclusionListProvider::new(lists),
            actor_blocklist,
        }
    }

    /// Build the store query, rejecting missing, malformed or blocked keys
    pub async fn query(&self, request: &RankingRequest) -> Result<EventListQuery> {
        let actor_key = request.filter_by_actor.as_str();
        if actor_key.is_empty() {
            return Err(LeaderboardError::invalid("param 'userPK' is required"));
        }
        if !is_valid_user_pk(actor_key) {
            return Err(LeaderboardError::invalid(format!(
                "param 'userPK' is not a valid user key: '{}'",
                actor_key
            )));
        }

        let sort_field = ListingField::parse(&request.sort_field).ok_or_else(|| {
            LeaderboardError::invalid(format!(
                "param 'sortBy' must be one of createdAt, skapp, identifier, entryType, got '{}'",
                request.sort_field
            ))
        })?;

        let blocked = self.exclusions.fetch(self.actor_blocklist).await?;
        if blocked.contains(actor_key) {
            return Err(LeaderboardError::invalid(format!(
                "param 'userPK' is blocked: '{}'",
                actor_key
            )));
        }

        Ok(EventListQuery {
            actor_key: actor_key.to_string(),
            sort_field,
            sort_direction: request.sort_direction,
            skip: request.skip,
            limit: request.limit,
        })
    }

    pub async fn list(&self, request: &RankingRequest) -> Result<Vec<ContentEntryRow>> {
        let query = self.query(request).await?;
        let events = self.events.list_events(&query).await?;
        debug!(
            actor = %query.actor_key,
            returned = events.len(),
            sort = query.sort_field.column(),
            "Listed actor content"
        );
        Ok(events.into_iter().map(ContentEntryRow::from).collect())
    }
}
