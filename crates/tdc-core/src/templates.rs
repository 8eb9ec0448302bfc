//! # Predefined Queries & Quick-Start Examples
//!
//! Predefined queries are advanced-query templates served by the Query
//! Service, keyed by name, in the order the service lists them. Loading one
//! replaces the whole advanced query.
//!
//! Quick-start examples are compiled in. Each is a partial simple query that
//! is merged into the current simple form.

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;
use crate::query::{Condition, Join, Query, SimpleQueryPatch, SortClause};

/// Condition values that mark a template as needing edits before it is
/// useful.
const PLACEHOLDER_VALUES: &[&str] = &["client_name_here", "subreddit_name", "removed"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTemplate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joins: Option<Vec<Join>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<SortClause>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
}

impl QueryTemplate {
    /// The query this template loads as: absent lists are empty, paging is
    /// reset to page 1 of 10, search is cleared.
    pub fn to_query(&self) -> Query {
        Query {
            conditions: self.conditions.clone().unwrap_or_default(),
            joins: self.joins.clone().unwrap_or_default(),
            sort: self.sort.clone().unwrap_or_default(),
            select: self.select.clone().unwrap_or_default(),
            ..Query::new(self.collection.clone())
        }
    }

    pub fn needs_parameters(&self) -> bool {
        self.conditions.iter().flatten().any(|c| {
            c.value()
                .map_or(false, |value| PLACEHOLDER_VALUES.contains(&value))
        })
    }
}

/// Templates keyed by name, in service order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredefinedQueries {
    entries: Vec<(String, QueryTemplate)>,
}

impl PredefinedQueries {
    pub fn new(entries: Vec<(String, QueryTemplate)>) -> Self {
        Self { entries }
    }

    /// Decode the `/query/predefined-queries` response body.
    pub fn from_json(value: serde_json::Value) -> Result<Self, TemplateError> {
        let serde_json::Value::Object(map) = value else {
            return Err(TemplateError::NotAnObject);
        };
        let mut entries = Vec::with_capacity(map.len());
        for (key, body) in map {
            let template = serde_json::from_value(body).map_err(|source| TemplateError::Template {
                key: key.clone(),
                source,
            })?;
            entries.push((key, template));
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&QueryTemplate> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, t)| t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryTemplate)> {
        self.entries.iter().map(|(k, t)| (k.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A canned starting point for the simple form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickStartExample {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub patch: SimpleQueryPatch,
}

pub fn quick_start_examples() -> Vec<QuickStartExample> {
    let findings = || Some("google_findings".to_string());
    let text = |s: &str| Some(s.to_string());

    vec![
        QuickStartExample {
            id: "google-findings-search",
            title: "Search Google Findings",
            description: "Find Google findings with text search (like 'sierra skye')",
            patch: SimpleQueryPatch {
                collection: findings(),
                search_text: text("sierra skye"),
                status: text(""),
                client_name: text(""),
                ..SimpleQueryPatch::default()
            },
        },
        QuickStartExample {
            id: "client-specific-findings",
            title: "Findings by Client",
            description: "Find all findings for a specific client",
            patch: SimpleQueryPatch {
                collection: findings(),
                client_name: text("Claire Stone"),
                status: text(""),
                search_text: text(""),
                ..SimpleQueryPatch::default()
            },
        },
        QuickStartExample {
            id: "status-based-search",
            title: "Filter by Status",
            description: "Find items with specific status (pending, removed, etc.)",
            patch: SimpleQueryPatch {
                collection: findings(),
                status: text("removed"),
                client_name: text(""),
                search_text: text(""),
                ..SimpleQueryPatch::default()
            },
        },
        QuickStartExample {
            id: "date-range-search",
            title: "Date Range Query",
            description: "Find items created within a specific time period",
            patch: SimpleQueryPatch {
                collection: findings(),
                date_from: text("2024-01-01"),
                date_to: text("2024-12-31"),
                client_name: text(""),
                search_text: text(""),
                ..SimpleQueryPatch::default()
            },
        },
    ]
}

pub fn find_example(id: &str) -> Option<QuickStartExample> {
    quick_start_examples().into_iter().find(|e| e.id == id)
}
