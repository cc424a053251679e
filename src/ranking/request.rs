//! Query parameter normalization
//!
//! Turns the raw query string of a leaderboard request into a canonical
//! [`RankingRequest`]. Pure validation: nothing here touches the store.

use std::collections::HashMap;

use crate::types::{LeaderboardError, Result};

/// Default page size
pub const DEFAULT_LIMIT: usize = 20;

/// Raw query value: a key given once or several times
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Single(String),
    Many(Vec<String>),
}

/// Untyped query input as received from the transport
#[derive(Debug, Clone, Default)]
pub struct RawQuery {
    params: HashMap<String, QueryValue>,
}

impl RawQuery {
    /// Parse a URL query string (without the leading `?`)
    pub fn parse(query: Option<&str>) -> Result<Self> {
        let query = query.unwrap_or("");
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| LeaderboardError::invalid(format!("malformed query string: {}", e)))?;

        let mut raw = Self::default();
        for (key, value) in pairs {
            raw.push(key, value);
        }
        Ok(raw)
    }

    /// Add a value, turning repeated keys into a list
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let key = key.into();
        let merged = match self.params.remove(&key) {
            None => QueryValue::Single(value),
            Some(QueryValue::Single(first)) => QueryValue::Many(vec![first, value]),
            Some(QueryValue::Many(mut values)) => {
                values.push(value);
                QueryValue::Many(values)
            }
        };
        self.params.insert(key, merged);
    }

    /// Builder-style [`push`](Self::push)
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.push(key, value);
        self
    }

    /// Single string value of `key`; a repeated key is a type mismatch
    pub fn string(&self, key: &str) -> Result<Option<&str>> {
        match self.params.get(key) {
            None => Ok(None),
            Some(QueryValue::Single(value)) => Ok(Some(value.as_str())),
            Some(QueryValue::Many(_)) => Err(LeaderboardError::invalid(format!(
                "param '{}' must be a string",
                key
            ))),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Mongo sort order value
    pub fn order(&self) -> i32 {
        match self {
            Self::Asc => 1,
            Self::Desc => -1,
        }
    }
}

/// Canonical leaderboard request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingRequest {
    pub filter_by_entity: String,
    pub filter_by_app: String,
    pub filter_by_actor: String,
    pub skip: usize,
    pub limit: usize,
    pub sort_field: String,
    pub sort_direction: SortDirection,
}

impl RankingRequest {
    /// Request with no filters and default pagination
    pub fn new(sort_field: &str) -> Self {
        Self {
            filter_by_entity: String::new(),
            filter_by_app: String::new(),
            filter_by_actor: String::new(),
            skip: 0,
            limit: DEFAULT_LIMIT,
            sort_field: sort_field.to_string(),
            sort_direction: SortDirection::Desc,
        }
    }
}

/// Validate and normalize raw query input
pub fn normalize(raw: &RawQuery, default_sort_field: &str) -> Result<RankingRequest> {
    let filter_by_entity = raw.string("identifier")?.unwrap_or_default().to_string();
    let filter_by_app = raw.string("skapp")?.unwrap_or_default().to_string();
    let filter_by_actor = raw.string("userPK")?.unwrap_or_default().to_string();

    let sort_direction = match raw.string("sortDir")? {
        None => SortDirection::Desc,
        Some("asc") => SortDirection::Asc,
        Some("desc") => SortDirection::Desc,
        Some(other) => {
            return Err(LeaderboardError::invalid(format!(
                "param 'sortDir' must be 'asc' or 'desc', got '{}'",
                other
            )))
        }
    };

    let sort_field = match raw.string("sortBy")? {
        Some(field) if !field.is_empty() => field.to_string(),
        _ => default_sort_field.to_string(),
    };

    let skip = match raw.string("skip")? {
        None => 0,
        Some(value) => parse_integer(value)
            .filter(|n| *n >= 0)
            .ok_or_else(|| {
                LeaderboardError::invalid("param 'skip' must be a non-negative integer")
            })?,
    };

    let limit = match raw.string("limit")? {
        None => DEFAULT_LIMIT as i64,
        Some(value) => parse_integer(value)
            .filter(|n| *n > 0)
            .ok_or_else(|| LeaderboardError::invalid("param 'limit' must be a positive integer"))?,
    };

    Ok(RankingRequest {
        filter_by_entity,
        filter_by_app,
        filter_by_actor,
        skip: usize::try_from(skip)
            .map_err(|_| LeaderboardError::invalid("param 'skip' is out of range"))?,
        limit: usize::try_from(limit)
            .map_err(|_| LeaderboardError::invalid("param 'limit' is out of range"))?,
        sort_field,
        sort_direction,
    })
}

fn parse_integer(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = normalize(&RawQuery::default(), "total").unwrap();
        assert_eq!(request, RankingRequest::new("total"));
        assert_eq!(request.limit, 20);
        assert_eq!(request.skip, 0);
        assert_eq!(request.sort_direction, SortDirection::Desc);
    }

    #[test]
    fn test_parse_query_string() {
        let raw = RawQuery::parse(Some("skapp=crqa&skip=20&limit=10&sortBy=last24H&sortDir=asc"))
            .unwrap();
        let request = normalize(&raw, "total").unwrap();

        assert_eq!(request.filter_by_app, "crqa");
        assert_eq!(request.skip, 20);
        assert_eq!(request.limit, 10);
        assert_eq!(request.sort_field, "last24H");
        assert_eq!(request.sort_direction, SortDirection::Asc);
    }

    #[test]
    fn test_percent_decoding() {
        let raw = RawQuery::parse(Some("identifier=sia%3A%2F%2Fabc")).unwrap();
        let request = normalize(&raw, "total").unwrap();
        assert_eq!(request.filter_by_entity, "sia://abc");
    }

    #[test]
    fn test_repeated_filter_is_rejected() {
        let raw = RawQuery::parse(Some("userPK=a&userPK=b")).unwrap();
        let err = normalize(&raw, "total").unwrap_err();
        assert!(matches!(err, LeaderboardError::InvalidParameter(_)));
        assert!(err.to_string().contains("userPK"));
    }

    #[test]
    fn test_invalid_sort_direction() {
        let raw = RawQuery::default().with("sortDir", "up");
        assert!(matches!(
            normalize(&raw, "total"),
            Err(LeaderboardError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_limit_must_be_positive() {
        for value in ["0", "-5", "ten", ""] {
            let raw = RawQuery::default().with("limit", value);
            assert!(
                matches!(normalize(&raw, "total"), Err(LeaderboardError::InvalidParameter(_))),
                "limit={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_skip_must_be_non_negative() {
        let raw = RawQuery::default().with("skip", "-1");
        assert!(normalize(&raw, "total").is_err());

        let raw = RawQuery::default().with("skip", "0");
        assert_eq!(normalize(&raw, "total").unwrap().skip, 0);
    }

    #[test]
    fn test_empty_sort_by_falls_back_to_default() {
        let raw = RawQuery::default().with("sortBy", "");
        assert_eq!(normalize(&raw, "newContentTotal").unwrap().sort_field, "newContentTotal");
    }
}
