use thiserror::Error;

/// Failure while loading a schema registry from JSON.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid schema document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("collection '{collection}' must map field names to field definitions")]
    NotAnObject { collection: String },

    #[error("invalid definition for '{collection}.{field}': {source}")]
    Field {
        collection: String,
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Which clause list an edit addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    Condition,
    Join,
    Sort,
}

impl std::fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Condition => write!(f, "condition"),
            Self::Join => write!(f, "join"),
            Self::Sort => write!(f, "sort"),
        }
    }
}

/// A rejected edit. The query is left exactly as it was; callers log these
/// and carry on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no {kind} at index {index} (have {len})")]
    IndexOutOfRange {
        kind: ClauseKind,
        index: usize,
        len: usize,
    },

    #[error("condition {index} does not take a list of values")]
    NotAListOperator { index: usize },

    #[error("'{value}' is not an allowed value for '{field}'")]
    ValueNotAllowed { field: String, value: String },
}

/// A predefined query template that could not be decoded.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("predefined queries must be a JSON object keyed by template name")]
    NotAnObject,

    #[error("invalid predefined query '{key}': {source}")]
    Template {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
