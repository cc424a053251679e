//! Database schemas for the leaderboard
//!
//! Defines MongoDB document structures for entries, users, and lists.

mod entry;
mod list;
mod user;

pub use entry::{EntryDoc, ENTRY_COLLECTION};
pub use list::{ListDoc, LIST_COLLECTION};
pub use user::{UserDoc, USER_COLLECTION};
