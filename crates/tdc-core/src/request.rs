//! # Query Serializer
//!
//! Turns a query into the request the Query Service expects. The two forms
//! are independent contracts against different endpoints, and both bodies
//! are the query structures verbatim: clauses with unselected fields are
//! included and no local validation happens here.

use crate::query::{Query, SimpleQuery};

pub const COLLECTIONS_PATH: &str = "/query/collections";
pub const PREDEFINED_PATH: &str = "/query/predefined-queries";
pub const EXECUTE_PATH: &str = "/query/execute";
pub const SIMPLE_QUERY_PATH: &str = "/query/simple-query";

/// A query ready to be posted.
#[derive(Debug, Clone, Copy)]
pub enum QueryRequest<'a> {
    Advanced(&'a Query),
    Simple(&'a SimpleQuery),
}

impl<'a> QueryRequest<'a> {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Advanced(_) => EXECUTE_PATH,
            Self::Simple(_) => SIMPLE_QUERY_PATH,
        }
    }

    pub fn collection(&self) -> &'a str {
        match self {
            Self::Advanced(q) => &q.collection,
            Self::Simple(q) => &q.collection,
        }
    }

    pub fn body(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Advanced(q) => serde_json::to_value(q),
            Self::Simple(q) => serde_json::to_value(q),
        }
    }
}

impl<'a> From<&'a Query> for QueryRequest<'a> {
    fn from(query: &'a Query) -> Self {
        Self::Advanced(query)
    }
}

impl<'a> From<&'a SimpleQuery> for QueryRequest<'a> {
    fn from(query: &'a SimpleQuery) -> Self {
        Self::Simple(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Condition, Direction, ExistenceOp, Join, ListOp, ScalarOp, SortClause};
    use serde_json::json;

    fn sample() -> Query {
        Query {
            collection: "google_findings".into(),
            conditions: vec![
                Condition::scalar("status", ScalarOp::Equals, "removed"),
                Condition::list(
                    "priority",
                    ListOp::Between,
                    vec!["Low".into(), "High".into()],
                ),
                Condition::existence("title", ExistenceOp::Exists),
                Condition::default(),
            ],
            joins: vec![
                Join::new("clients", "client_id", "_id", "client"),
                Join::default(),
            ],
            sort: vec![SortClause::new("created", Direction::Desc)],
            select: vec!["url".into(), "title".into()],
            page: 2,
            limit: 25,
            search: Some("sierra".into()),
        }
    }

    #[test]
    fn test_advanced_body_mirrors_query() {
        let query = sample();
        let body = QueryRequest::from(&query).body().unwrap();

        assert_eq!(body["collection"], "google_findings");
        assert_eq!(body["page"], 2);
        assert_eq!(body["limit"], 25);
        assert_eq!(body["search"], "sierra");
        assert_eq!(body["select"], json!(["url", "title"]));
        assert_eq!(body["conditions"].as_array().unwrap().len(), 4);
        assert_eq!(
            body["conditions"][3],
            json!({"field": "", "operator": "equals", "value": ""})
        );
        assert_eq!(
            body["joins"][1],
            json!({"collection": "", "localField": "", "foreignField": "", "as": ""})
        );
        assert_eq!(body["sort"], json!([{"field": "created", "direction": "desc"}]));

        let back: Query = serde_json::from_value(body).unwrap();
        assert_eq!(back, query);
    }

    #[test]
    fn test_simple_body_is_verbatim() {
        let simple = SimpleQuery {
            client_name: "Claire Stone".into(),
            date_from: "2024-01-01".into(),
            ..SimpleQuery::default()
        };
        let request = QueryRequest::from(&simple);
        assert_eq!(request.path(), "/query/simple-query");
        assert_eq!(request.collection(), "google_findings");

        let body = request.body().unwrap();
        assert_eq!(body["clientName"], "Claire Stone");
        assert_eq!(body["dateFrom"], "2024-01-01");
        assert!(body.get("conditions").is_none());
    }

    #[test]
    fn test_paths() {
        let query = Query::default();
        assert_eq!(QueryRequest::from(&query).path(), "/query/execute");
    }
}
