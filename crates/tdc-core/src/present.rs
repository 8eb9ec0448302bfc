//! # Result Presenter
//!
//! Derives a column set and a per-cell display strategy from a
//! [`ResultPage`] without assuming a fixed row shape. Rows on one page may
//! carry different keys (optional joins), so columns are the union of all
//! keys in first-seen order. The page itself is never modified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::display_name;

/// Longest string shown untruncated.
pub const MAX_CELL_CHARS: usize = 50;

/// One page of query output, as returned by the Query Service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultPage {
    pub data: Vec<serde_json::Value>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    /// Milliseconds spent by the service.
    pub execution_time: u64,
}

/// Union of the keys of every row, in first-seen order.
pub fn columns(rows: &[serde_json::Value]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for row in rows {
        if let Some(object) = row.as_object() {
            for key in object.keys() {
                if !seen.iter().any(|k| k == key) {
                    seen.push(key.clone());
                }
            }
        }
    }
    seen
}

/// How a single value is shown.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// `null` or a key the row does not have.
    Empty,
    EmptyArray,
    Array {
        len: usize,
        raw: serde_json::Value,
    },
    /// A joined client document.
    Client {
        name: String,
        plan: Option<String>,
        priority: Option<String>,
        raw: serde_json::Value,
    },
    Object {
        fields: usize,
        raw: serde_json::Value,
    },
    Flag(bool),
    Date {
        formatted: String,
        raw: String,
    },
    Link {
        url: String,
        display: String,
    },
    /// Long text cut to [`MAX_CELL_CHARS`]; `full` is what gets copied.
    Truncated {
        display: String,
        full: String,
    },
    Text(String),
}

impl Cell {
    pub fn classify(value: Option<&serde_json::Value>) -> Self {
        use serde_json::Value;

        match value {
            None | Some(Value::Null) => Self::Empty,
            Some(Value::Array(items)) if items.is_empty() => Self::EmptyArray,
            Some(raw @ Value::Array(items)) => Self::Array {
                len: items.len(),
                raw: raw.clone(),
            },
            Some(raw @ Value::Object(map)) => match map.get("client_name").and_then(truthy_text) {
                Some(name) => Self::Client {
                    name,
                    plan: map.get("plan").and_then(truthy_text),
                    priority: map.get("priority").and_then(truthy_text),
                    raw: raw.clone(),
                },
                None => Self::Object {
                    fields: map.len(),
                    raw: raw.clone(),
                },
            },
            Some(Value::Bool(b)) => Self::Flag(*b),
            Some(Value::Number(n)) => Self::classify_text(n.to_string()),
            Some(Value::String(s)) => Self::classify_text(s.clone()),
        }
    }

    fn classify_text(text: String) -> Self {
        if let Some(formatted) = format_timestamp(&text) {
            return Self::Date {
                formatted,
                raw: text,
            };
        }
        if text.starts_with("http") {
            return Self::Link {
                display: truncate(&text).unwrap_or_else(|| text.clone()),
                url: text,
            };
        }
        match truncate(&text) {
            Some(display) => Self::Truncated {
                display,
                full: text,
            },
            None => Self::Text(text),
        }
    }

    /// Single-line text for a table cell.
    pub fn render(&self) -> String {
        match self {
            Self::Empty => "null".to_string(),
            Self::EmptyArray => "[]".to_string(),
            Self::Array { len, .. } => format!("[{} items]", len),
            Self::Client {
                name,
                plan,
                priority,
                ..
            } => {
                let tags: Vec<&str> = [plan, priority]
                    .into_iter()
                    .filter_map(|t| t.as_deref())
                    .collect();
                if tags.is_empty() {
                    name.clone()
                } else {
                    format!("{} ({})", name, tags.join(", "))
                }
            }
            Self::Object { fields, .. } => format!("{} fields", fields),
            Self::Flag(true) => "Yes".to_string(),
            Self::Flag(false) => "No".to_string(),
            Self::Date { formatted, .. } => formatted.clone(),
            Self::Link { display, .. } => display.clone(),
            Self::Truncated { display, .. } => display.clone(),
            Self::Text(text) => text.clone(),
        }
    }

    /// Full content behind a compact cell: pretty JSON for arrays and
    /// objects, the untruncated text for long strings.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Array { raw, .. } | Self::Client { raw, .. } | Self::Object { raw, .. } => {
                serde_json::to_string_pretty(raw).ok()
            }
            Self::Truncated { full, .. } => Some(full.clone()),
            _ => None,
        }
    }
}

/// `client_name` and friends count when they are non-empty, non-false.
fn truthy_text(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

fn truncate(text: &str) -> Option<String> {
    if text.chars().count() > MAX_CELL_CHARS {
        Some(format!(
            "{}...",
            text.chars().take(MAX_CELL_CHARS).collect::<String>()
        ))
    } else {
        None
    }
}

/// ISO-8601 timestamps in UTC (`...T...Z`) as `YYYY-MM-DD HH:MM:SS UTC`.
fn format_timestamp(text: &str) -> Option<String> {
    if !text.contains('T') || !text.ends_with('Z') {
        return None;
    }
    let parsed = DateTime::parse_from_rfc3339(text).ok()?;
    Some(
        parsed
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string(),
    )
}

/// Column headers plus classified cells for every row.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ResultTable {
    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| display_name(c)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn present(page: &ResultPage) -> ResultTable {
    let columns = columns(&page.data);
    let rows = page
        .data
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| Cell::classify(row.get(column)))
                .collect()
        })
        .collect();
    ResultTable { columns, rows }
}

/// Paging controls for the current page. Moving means executing the query
/// again with the page number returned here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNav {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
    pub row_count: usize,
}

impl PageNav {
    pub fn of(page: &ResultPage) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages: page.total_pages,
            has_next: page.has_next_page,
            has_prev: page.has_prev_page,
            row_count: page.data.len(),
        }
    }

    pub fn next(&self) -> Option<u32> {
        self.has_next
            .then(|| self.page.saturating_add(1).min(self.total_pages))
    }

    pub fn prev(&self) -> Option<u32> {
        self.has_prev.then(|| self.page.saturating_sub(1).max(1))
    }

    /// Controls are only worth showing with more than one page.
    pub fn has_controls(&self) -> bool {
        self.total_pages > 1
    }

    pub fn summary(&self) -> String {
        if self.row_count == 0 {
            return "No results found".to_string();
        }
        let limit = u64::from(self.limit);
        let page = u64::from(self.page.max(1));
        let from = (page - 1) * limit + 1;
        let to = (page * limit).min(self.total);
        format!("Showing {} to {} of {} results", from, to, self.total)
    }

    pub fn position(&self) -> String {
        format!("Page {} of {}", self.page, self.total_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_columns_first_seen_order() {
        let rows = vec![json!({"a": 1, "b": 2}), json!({"b": 3, "c": 4})];
        assert_eq!(columns(&rows), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_columns_keep_wire_key_order() {
        let rows: Vec<serde_json::Value> =
            serde_json::from_str(r#"[{"url": "x", "_id": "1", "created": "y"}]"#).unwrap();
        assert_eq!(columns(&rows), vec!["url", "_id", "created"]);
    }

    #[test]
    fn test_long_string_is_truncated_with_copyable_full_text() {
        let long = "x".repeat(60);
        let cell = Cell::classify(Some(&json!(long)));
        match &cell {
            Cell::Truncated { display, full } => {
                assert_eq!(display, &format!("{}...", "x".repeat(50)));
                assert_eq!(full, &long);
            }
            other => panic!("expected truncated cell, got {:?}", other),
        }
        assert_eq!(cell.detail(), Some(long));
    }

    #[test]
    fn test_exactly_fifty_chars_is_plain_text() {
        let text = "y".repeat(50);
        assert_eq!(Cell::classify(Some(&json!(text))), Cell::Text(text));
    }

    #[test]
    fn test_iso_timestamp_renders_as_date() {
        let cell = Cell::classify(Some(&json!("2024-05-01T12:00:00Z")));
        assert_eq!(
            cell,
            Cell::Date {
                formatted: "2024-05-01 12:00:00 UTC".into(),
                raw: "2024-05-01T12:00:00Z".into()
            }
        );
        let with_millis = Cell::classify(Some(&json!("2024-05-01T12:00:00.250Z")));
        assert!(matches!(with_millis, Cell::Date { .. }));
    }

    #[test]
    fn test_non_utc_or_plain_dates_stay_text() {
        assert_eq!(
            Cell::classify(Some(&json!("2024-05-01"))),
            Cell::Text("2024-05-01".into())
        );
        assert!(matches!(
            Cell::classify(Some(&json!("2024-05-01T12:00:00+02:00"))),
            Cell::Text(_)
        ));
    }

    #[test]
    fn test_empty_array_differs_from_empty_object() {
        let array = Cell::classify(Some(&json!([])));
        let object = Cell::classify(Some(&json!({})));
        assert_eq!(array, Cell::EmptyArray);
        assert_eq!(array.render(), "[]");
        assert_eq!(object.render(), "0 fields");
        assert_ne!(array.render(), object.render());
    }

    #[test]
    fn test_missing_and_null_are_empty() {
        assert_eq!(Cell::classify(None), Cell::Empty);
        assert_eq!(Cell::classify(Some(&json!(null))), Cell::Empty);
    }

    #[test]
    fn test_client_summary() {
        let client = json!({"client_name": "Claire Stone", "plan": "VIP", "priority": "High", "agency": "A"});
        let cell = Cell::classify(Some(&client));
        assert_eq!(cell.render(), "Claire Stone (VIP, High)");
        assert!(cell.detail().unwrap().contains("\"agency\": \"A\""));

        let unnamed = Cell::classify(Some(&json!({"client_name": "", "plan": "VIP"})));
        assert_eq!(unnamed.render(), "2 fields");
    }

    #[test]
    fn test_scalar_cells() {
        assert_eq!(Cell::classify(Some(&json!(true))).render(), "Yes");
        assert_eq!(Cell::classify(Some(&json!(false))).render(), "No");
        assert_eq!(Cell::classify(Some(&json!(42))).render(), "42");
        assert_eq!(Cell::classify(Some(&json!([1, 2, 3]))).render(), "[3 items]");

        let link = Cell::classify(Some(&json!("https://example.com/a")));
        assert_eq!(
            link,
            Cell::Link {
                url: "https://example.com/a".into(),
                display: "https://example.com/a".into()
            }
        );
    }

    #[test]
    fn test_present_fills_missing_keys() {
        let page = ResultPage {
            data: vec![json!({"a": 1}), json!({"b": "x"})],
            total: 2,
            page: 1,
            limit: 10,
            total_pages: 1,
            ..ResultPage::default()
        };
        let before = page.clone();
        let table = present(&page);
        assert_eq!(table.columns, vec!["a", "b"]);
        assert_eq!(table.rows[0][1], Cell::Empty);
        assert_eq!(table.rows[1][0], Cell::Empty);
        assert_eq!(table.headers(), vec!["A", "B"]);
        assert_eq!(page, before);
    }

    #[test]
    fn test_result_page_wire_names() {
        let page: ResultPage = serde_json::from_value(json!({
            "data": [{"a": 1}],
            "total": 31,
            "page": 2,
            "limit": 10,
            "totalPages": 4,
            "hasNextPage": true,
            "hasPrevPage": true,
            "executionTime": 12
        }))
        .unwrap();
        assert_eq!(page.total_pages, 4);
        assert!(page.has_next_page);
        assert_eq!(page.execution_time, 12);
    }

    #[test]
    fn test_page_nav() {
        let page = ResultPage {
            data: vec![json!({"a": 1})],
            total: 31,
            page: 4,
            limit: 10,
            total_pages: 4,
            has_next_page: false,
            has_prev_page: true,
            execution_time: 3,
        };
        let nav = PageNav::of(&page);
        assert_eq!(nav.next(), None);
        assert_eq!(nav.prev(), Some(3));
        assert!(nav.has_controls());
        assert_eq!(nav.summary(), "Showing 31 to 31 of 31 results");
        assert_eq!(nav.position(), "Page 4 of 4");

        let first = PageNav::of(&ResultPage {
            page: 1,
            has_next_page: true,
            has_prev_page: false,
            ..page.clone()
        });
        assert_eq!(first.next(), Some(2));
        assert_eq!(first.prev(), None);
        assert_eq!(first.summary(), "Showing 1 to 10 of 31 results");
    }

    #[test]
    fn test_empty_page_summary() {
        assert_eq!(
            PageNav::of(&ResultPage::default()).summary(),
            "No results found"
        );
    }
}
