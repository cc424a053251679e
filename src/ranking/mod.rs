//! Leaderboard ranking
//!
//! Request normalization, event grouping, ranking and row assembly. Nothing
//! in here talks to MongoDB directly; stores are reached through the traits
//! in [`crate::store`].

pub mod aggregate;
pub mod assembler;
pub mod engine;
pub mod exclusion;
pub mod kind;
pub mod listing;
pub mod model;
pub mod request;
pub mod rows;

pub use aggregate::{group_events, EventPattern, GroupQuery};
pub use assembler::ResultAssembler;
pub use engine::{EngineConfig, RankedGroup, RankedPage, RankingEngine};
pub use exclusion::{ExclusionList, ExclusionListProvider, ListType};
pub use kind::{Metric, RankingKind};
pub use listing::{select_events, ContentListing, EventListQuery, ListingField, DEFAULT_LISTING_SORT};
pub use model::{
    is_valid_user_pk, Counters, Event, EventField, EventKind, GroupStats, Identity,
    IdentityProfile, Representative, UNKNOWN_CREATOR, USER_PK_LENGTH,
};
pub use request::{normalize, RankingRequest, RawQuery, SortDirection, DEFAULT_LIMIT};
pub use rows::{ContentEntryRow, ContentRow, SkappRow, UserRow};
