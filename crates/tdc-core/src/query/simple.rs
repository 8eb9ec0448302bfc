//! # Simple Query
//!
//! The fixed-shape form for the common single-collection case: client name,
//! status, priority, a date range and free text. It is posted verbatim to
//! `/query/simple-query` and never translated into advanced conditions.

use serde::{Deserialize, Serialize};

use super::{parse_limit_input, parse_page_input, DEFAULT_LIMIT, DEFAULT_PAGE};

/// Collections offered by the simple form, with their labels.
pub const SIMPLE_COLLECTIONS: &[(&str, &str)] = &[
    ("google_findings", "Google Findings"),
    ("twitter_findings", "Twitter Findings"),
    ("reddit_data", "Reddit Data"),
    ("colab_links", "Colab Links"),
    ("clients", "Clients"),
];

/// Status filter choices. The empty choice means any status.
pub const SIMPLE_STATUSES: &[&str] = &["rejected", "delisted", "counter-notice"];

pub const SIMPLE_PRIORITIES: &[&str] = &["Low", "Medium", "High", "Critical"];

pub const SIMPLE_LIMITS: &[u32] = &[10, 25, 50, 100];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleQuery {
    pub collection: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: String,
    /// `YYYY-MM-DD` or empty.
    #[serde(default)]
    pub date_from: String,
    #[serde(default)]
    pub date_to: String,
    #[serde(default)]
    pub search_text: String,
    pub limit: u32,
    pub page: u32,
}

impl Default for SimpleQuery {
    fn default() -> Self {
        Self {
            collection: "google_findings".to_string(),
            client_name: String::new(),
            status: String::new(),
            priority: String::new(),
            date_from: String::new(),
            date_to: String::new(),
            search_text: String::new(),
            limit: DEFAULT_LIMIT,
            page: DEFAULT_PAGE,
        }
    }
}

impl SimpleQuery {
    pub fn set_limit_input(&mut self, raw: &str) {
        self.limit = parse_limit_input(raw);
    }

    pub fn set_page_input(&mut self, raw: &str) {
        self.page = parse_page_input(raw);
    }

    /// Shallow merge: only the fields present in `patch` change.
    pub fn apply(&mut self, patch: &SimpleQueryPatch) {
        let SimpleQueryPatch {
            collection,
            client_name,
            status,
            priority,
            date_from,
            date_to,
            search_text,
            limit,
            page,
        } = patch;

        if let Some(v) = collection {
            self.collection = v.clone();
        }
        if let Some(v) = client_name {
            self.client_name = v.clone();
        }
        if let Some(v) = status {
            self.status = v.clone();
        }
        if let Some(v) = priority {
            self.priority = v.clone();
        }
        if let Some(v) = date_from {
            self.date_from = v.clone();
        }
        if let Some(v) = date_to {
            self.date_to = v.clone();
        }
        if let Some(v) = search_text {
            self.search_text = v.clone();
        }
        if let Some(v) = limit {
            self.limit = *v;
        }
        if let Some(v) = page {
            self.page = *v;
        }
    }
}

/// A partial [`SimpleQuery`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleQueryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}
