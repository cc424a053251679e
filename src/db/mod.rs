//! MongoDB access layer
//!
//! Typed collections over the `entries`, `users` and `lists` collections.

pub mod mongo;
pub mod schemas;

pub use mongo::{is_duplicate_key, IntoIndexes, MongoClient, MongoCollection};
