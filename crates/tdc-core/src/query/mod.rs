//! # Query Model
//!
//! The advanced [`Query`] (conditions, joins, sort, select, paging, free
//! text) and the flat [`SimpleQuery`] form. Both are plain serde data; the
//! [`QueryEditor`] applies user edits to an advanced query while keeping its
//! field references bound to the injected schema registry.

pub mod clause;
pub mod condition;
pub mod editor;
pub mod simple;

pub use clause::{Direction, Join, JoinPatch, SortClause, SortPatch};
pub use condition::{
    Condition, ConditionPatch, ExistenceOp, ListOp, Operator, OperatorClass, ParseOperatorError,
    ScalarOp,
};
pub use editor::QueryEditor;
pub use simple::{SimpleQuery, SimpleQueryPatch};

use serde::{Deserialize, Serialize};

use crate::error::ClauseKind;

pub const DEFAULT_COLLECTION: &str = "clients";
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// An advanced query, exactly as posted to `/query/execute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub collection: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub joins: Vec<Join>,
    #[serde(default)]
    pub sort: Vec<SortClause>,
    #[serde(default)]
    pub select: Vec<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Default for Query {
    fn default() -> Self {
        Self::new(DEFAULT_COLLECTION)
    }
}

impl Query {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            conditions: Vec::new(),
            joins: Vec::new(),
            sort: Vec::new(),
            select: Vec::new(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            search: Some(String::new()),
        }
    }

    /// Clauses that still have an unselected field. They are sent as they
    /// are; this only lets a front end point them out.
    pub fn unselected_clauses(&self) -> Vec<(ClauseKind, usize)> {
        let conditions = self
            .conditions
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_unselected())
            .map(|(i, _)| (ClauseKind::Condition, i));
        let joins = self
            .joins
            .iter()
            .enumerate()
            .filter(|(_, j)| j.is_unselected())
            .map(|(i, _)| (ClauseKind::Join, i));
        let sorts = self
            .sort
            .iter()
            .enumerate()
            .filter(|(_, s)| s.field.is_empty())
            .map(|(i, _)| (ClauseKind::Sort, i));
        conditions.chain(joins).chain(sorts).collect()
    }
}

fn default_page() -> u32 {
    DEFAULT_PAGE
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// Split a comma-separated list: pieces are trimmed, empty pieces dropped,
/// order and duplicates kept.
pub fn split_values(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Page number from free text. Anything below 1 or unparsable is 1.
pub fn parse_page_input(raw: &str) -> u32 {
    match leading_int(raw) {
        Some(n) if n >= 1 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => DEFAULT_PAGE,
    }
}

/// Page size from free text. Anything below 1 or unparsable is 10; values
/// above 100 are capped.
pub fn parse_limit_input(raw: &str) -> u32 {
    match leading_int(raw) {
        Some(n) if n >= 1 => u32::try_from(n.min(i64::from(MAX_LIMIT))).unwrap_or(MAX_LIMIT),
        _ => DEFAULT_LIMIT,
    }
}

/// Integer prefix of `raw` after leading whitespace (`"12abc"` → 12,
/// `"-3"` → -3, `"abc"` → none). Overlong digit runs saturate.
fn leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits: &str = {
        let end = rest
            .bytes()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() {
        return None;
    }
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_values() {
        assert_eq!(split_values("a, b ,c,,d"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_values("x,x, x"), vec!["x", "x", "x"]);
        assert!(split_values(" , ,").is_empty());
    }

    #[test]
    fn test_page_input() {
        assert_eq!(parse_page_input("3"), 3);
        assert_eq!(parse_page_input("0"), 1);
        assert_eq!(parse_page_input("-4"), 1);
        assert_eq!(parse_page_input("abc"), 1);
        assert_eq!(parse_page_input(""), 1);
        assert_eq!(parse_page_input("7th"), 7);
    }

    #[test]
    fn test_limit_input() {
        assert_eq!(parse_limit_input("25"), 25);
        assert_eq!(parse_limit_input("0"), 10);
        assert_eq!(parse_limit_input("-1"), 10);
        assert_eq!(parse_limit_input("ten"), 10);
        assert_eq!(parse_limit_input("500"), 100);
        assert_eq!(parse_limit_input("99999999999999999999999"), 100);
    }

    #[test]
    fn test_new_query_defaults() {
        let q = Query::default();
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({
                "collection": "clients",
                "conditions": [],
                "joins": [],
                "sort": [],
                "select": [],
                "page": 1,
                "limit": 10,
                "search": ""
            })
        );
    }

    #[test]
    fn test_unselected_clauses() {
        let mut q = Query::new("google_findings");
        q.conditions.push(Condition::default());
        q.conditions
            .push(Condition::scalar("status", ScalarOp::Equals, "removed"));
        q.joins.push(Join::new("clients", "client_id", "", "client"));
        q.sort.push(SortClause::new("created", Direction::Desc));
        q.sort.push(SortClause::default());

        assert_eq!(
            q.unselected_clauses(),
            vec![
                (ClauseKind::Condition, 0),
                (ClauseKind::Join, 0),
                (ClauseKind::Sort, 1)
            ]
        );
    }
}
