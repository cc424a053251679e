//! MongoDB query documents
//!
//! [`group_pipeline`] is the aggregation equivalent of
//! [`crate::ranking::group_events`]:
//!
//! ```text
//! $match     root/skapp/group key present, blocklists, event patterns
//! $addFields _recent, _isCreation, _isInteraction
//! $sort      (content only) creation first, newest, highest identifier
//! $group     conditional $sum counters, $first representative fields
//! ```

use bson::{doc, Bson, Document};

use crate::ranking::{
    Counters, EventListQuery, GroupQuery, GroupStats, ListingField, Representative,
};
use crate::types::{LeaderboardError, Result};

/// `type` value of creation events
const CREATION_TYPE: &str = "newcontent";
/// `type` value of interaction events
const INTERACTION_TYPE: &str = "interaction";

fn present(column: &str) -> Document {
    doc! { column: { "$nin": [Bson::Null, ""] } }
}

fn conditional_count(condition: impl Into<Bson>) -> Document {
    doc! { "$sum": { "$cond": [condition.into(), 1, 0] } }
}

/// `$match` conditions of a grouping query
pub fn match_conditions(query: &GroupQuery) -> Vec<Document> {
    let mut required = Vec::new();
    if query.kind.requires_root() {
        required.push("root");
    }
    if query.kind.requires_app() {
        required.push("skapp");
    }
    let group_column = query.kind.group_field().column();
    if !required.contains(&group_column) {
        required.push(group_column);
    }

    let mut conditions: Vec<Document> = required.into_iter().map(present).collect();

    if !query.excluded_actors.is_empty() {
        conditions.push(doc! { "userPK": { "$nin": query.excluded_actors.clone() } });
    }
    if !query.excluded_apps.is_empty() {
        conditions.push(doc! { "skapp": { "$nin": query.excluded_apps.clone() } });
    }

    for pattern in &query.patterns {
        conditions.push(doc! {
            pattern.field.column(): { "$regex": regex::escape(&pattern.needle) }
        });
    }

    conditions
}

/// Aggregation pipeline grouping `entries` for `query`
pub fn group_pipeline(query: &GroupQuery) -> Vec<Document> {
    let recent_since = bson::DateTime::from_chrono(query.recent_since);
    let mut pipeline = vec![
        doc! { "$match": { "$and": match_conditions(query) } },
        doc! {
            "$addFields": {
                "_recent": { "$gte": ["$createdAt", recent_since] },
                "_isCreation": { "$eq": ["$type", CREATION_TYPE] },
                "_isInteraction": { "$eq": ["$type", INTERACTION_TYPE] },
            }
        },
    ];

    let has_representative = query.kind.has_representative();
    if has_representative {
        pipeline.push(doc! { "$sort": { "_isCreation": -1, "createdAt": -1, "identifier": -1 } });
    }

    let mut group = doc! {
        "_id": format!("${}", query.kind.group_field().column()),
        "total": { "$sum": 1 },
        "recent": conditional_count("$_recent"),
        "creationTotal": conditional_count("$_isCreation"),
        "creationRecent": conditional_count(doc! { "$and": ["$_isCreation", "$_recent"] }),
        "interactionTotal": conditional_count("$_isInteraction"),
        "interactionRecent": conditional_count(doc! { "$and": ["$_isInteraction", "$_recent"] }),
    };
    if has_representative {
        group.insert("skapp", doc! { "$first": "$skapp" });
        group.insert("skylink", doc! { "$first": "$skylink" });
        group.insert("metadata", doc! { "$first": "$metadata" });
        group.insert(
            "creator",
            doc! { "$first": { "$cond": ["$_isCreation", "$userPK", Bson::Null] } },
        );
    }
    pipeline.push(doc! { "$group": group });

    pipeline
}

fn count(document: &Document, field: &str) -> u64 {
    match document.get(field) {
        Some(Bson::Int32(n)) => (*n).max(0) as u64,
        Some(Bson::Int64(n)) => (*n).max(0) as u64,
        Some(Bson::Double(n)) if *n > 0.0 => *n as u64,
        _ => 0,
    }
}

fn string_field(document: &Document, field: &str) -> String {
    match document.get(field) {
        Some(Bson::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Decode one `$group` output document
pub fn decode_group(document: &Document, has_representative: bool) -> Result<GroupStats> {
    let key = match document.get("_id") {
        Some(Bson::String(key)) => key.clone(),
        Some(other) => other.to_string(),
        None => {
            return Err(LeaderboardError::StoreUnavailable(
                "group document without _id".into(),
            ))
        }
    };

    let counters = Counters {
        total: count(document, "total"),
        recent: count(document, "recent"),
        creation_total: count(document, "creationTotal"),
        creation_recent: count(document, "creationRecent"),
        interaction_total: count(document, "interactionTotal"),
        interaction_recent: count(document, "interactionRecent"),
    };

    let representative = has_representative.then(|| Representative {
        app_name: string_field(document, "skapp"),
        link: string_field(document, "skylink"),
        metadata: document
            .get("metadata")
            .cloned()
            .unwrap_or(Bson::Null)
            .into_relaxed_extjson(),
        creator: match document.get("creator") {
            Some(Bson::String(creator)) => Some(creator.clone()),
            _ => None,
        },
    });

    Ok(GroupStats {
        key,
        counters,
        representative,
    })
}

/// Filter selecting one actor's events that belong to some root
pub fn listing_filter(query: &EventListQuery) -> Document {
    let mut filter = present("root");
    filter.insert("userPK", query.actor_key.as_str());
    filter
}

/// Sort document of an actor listing
pub fn listing_sort(query: &EventListQuery) -> Document {
    let order = query.sort_direction.order();
    if query.sort_field == ListingField::Identifier {
        return doc! { "identifier": order };
    }
    doc! {
        query.sort_field.column(): order,
        "identifier": -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::{EventField, EventPattern, RankingKind, SortDirection};
    use chrono::{DateTime, Utc};

    fn now() -> DateTime<Utc> {
        "2024-03-01T12:00:00Z".parse().unwrap()
    }

    fn stage_names(pipeline: &[Document]) -> Vec<String> {
        pipeline
            .iter()
            .filter_map(|stage| stage.keys().next().cloned())
            .collect()
    }

    #[test]
    fn test_content_pipeline_sorts_before_group() {
        let pipeline = group_pipeline(&GroupQuery::new(RankingKind::Content, now()));
        assert_eq!(
            stage_names(&pipeline),
            vec!["$match", "$addFields", "$sort", "$group"]
        );

        let group = pipeline[3].get_document("$group").unwrap();
        assert_eq!(group.get_str("_id").unwrap(), "$root");
        assert!(group.contains_key("creator"));
        assert!(group.contains_key("skylink"));
    }

    #[test]
    fn test_actor_pipeline_has_no_representative() {
        let pipeline = group_pipeline(&GroupQuery::new(RankingKind::User, now()));
        assert_eq!(stage_names(&pipeline), vec!["$match", "$addFields", "$group"]);

        let group = pipeline[2].get_document("$group").unwrap();
        assert_eq!(group.get_str("_id").unwrap(), "$userPK");
        assert!(!group.contains_key("creator"));
    }

    #[test]
    fn test_match_conditions_per_kind() {
        let skapp = match_conditions(&GroupQuery::new(RankingKind::Skapp, now()));
        assert_eq!(skapp, vec![present("root"), present("skapp")]);

        let user = match_conditions(&GroupQuery::new(RankingKind::User, now()));
        assert_eq!(user, vec![present("userPK")]);
    }

    #[test]
    fn test_patterns_are_escaped_literals() {
        let mut query = GroupQuery::new(RankingKind::User, now());
        query.patterns.push(EventPattern::new(EventField::AppName, "a.b"));
        query.excluded_actors.push("spam".to_string());

        let conditions = match_conditions(&query);
        assert_eq!(conditions[1], doc! { "userPK": { "$nin": ["spam"] } });
        assert_eq!(conditions[2], doc! { "skapp": { "$regex": "a\\.b" } });
    }

    #[test]
    fn test_decode_group_counts_and_creator() {
        let document = doc! {
            "_id": "root-a",
            "total": 2_i32,
            "recent": 1_i64,
            "creationTotal": 1_i32,
            "creationRecent": 0_i32,
            "interactionTotal": 1_i32,
            "interactionRecent": 1_i32,
            "skapp": "X",
            "skylink": "sia://a",
            "metadata": { "title": "t" },
            "creator": "u1",
        };

        let stats = decode_group(&document, true).unwrap();
        assert_eq!(stats.key, "root-a");
        assert_eq!(stats.counters.total, 2);
        assert_eq!(stats.counters.recent, 1);
        let rep = stats.representative.unwrap();
        assert_eq!(rep.creator.as_deref(), Some("u1"));
        assert_eq!(rep.metadata["title"], "t");

        let no_creator = doc! { "_id": "b", "total": 1_i32, "creator": Bson::Null };
        let stats = decode_group(&no_creator, true).unwrap();
        assert_eq!(stats.representative.unwrap().creator, None);
    }

    #[test]
    fn test_listing_sort_breaks_ties_by_identifier() {
        let query = EventListQuery {
            actor_key: "k".to_string(),
            sort_field: ListingField::CreatedAt,
            sort_direction: SortDirection::Asc,
            skip: 0,
            limit: 20,
        };
        assert_eq!(listing_sort(&query), doc! { "createdAt": 1, "identifier": -1 });
        assert_eq!(listing_filter(&query).get_str("userPK").unwrap(), "k");
    }
}
