//! Join and sort clauses.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Attach matching documents of `collection` under the alias `as`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Join {
    #[serde(default)]
    pub collection: String,
    /// Field of the queried collection.
    #[serde(default)]
    pub local_field: String,
    /// Field of the joined collection.
    #[serde(default)]
    pub foreign_field: String,
    #[serde(rename = "as", default)]
    pub alias: String,
}

impl Join {
    pub fn new(
        collection: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
            alias: alias.into(),
        }
    }

    /// True when any of collection, local field or foreign field is unset.
    pub fn is_unselected(&self) -> bool {
        self.collection.is_empty() || self.local_field.is_empty() || self.foreign_field.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinPatch {
    pub collection: Option<String>,
    pub local_field: Option<String>,
    pub foreign_field: Option<String>,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortClause {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub direction: Direction,
}

impl SortClause {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortPatch {
    pub field: Option<String>,
    pub direction: Option<Direction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_wire_keys() {
        let join = Join::new("clients", "client_id", "_id", "client");
        assert_eq!(
            serde_json::to_value(&join).unwrap(),
            json!({
                "collection": "clients",
                "localField": "client_id",
                "foreignField": "_id",
                "as": "client"
            })
        );
    }

    #[test]
    fn test_default_join_is_unselected() {
        assert!(Join::default().is_unselected());
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("DESC".parse::<Direction>().unwrap(), Direction::Desc);
        assert_eq!("ascending".parse::<Direction>().unwrap(), Direction::Asc);
        assert!("up".parse::<Direction>().is_err());
    }

    #[test]
    fn test_default_sort_shape() {
        assert_eq!(
            serde_json::to_value(SortClause::default()).unwrap(),
            json!({"field": "", "direction": "asc"})
        );
    }
}
