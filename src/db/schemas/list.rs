//! List document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::ranking::ListType;

/// Collection name for lists
pub const LIST_COLLECTION: &str = "lists";

/// Allow/block list stored in MongoDB, one document per type
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ListDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(rename = "type")]
    pub list_type: ListType,

    #[serde(default)]
    pub items: Vec<String>,
}

impl IntoIndexes for ListDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "type": 1 },
            Some(IndexOptions::builder().name("type_index".to_string()).build()),
        )]
    }
}
