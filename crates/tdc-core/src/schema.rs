//! # Schema Registry
//!
//! Field definitions for every collection the Query Service knows about.
//! The registry is built once at startup (either from the built-in table or
//! from a JSON override file) and then shared read-only, usually behind an
//! `Arc`, with everything that needs field metadata.
//!
//! Field order is the definition order. Field pickers and schema listings
//! rely on it being stable.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Semantic type of a collection field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    String,
    Number,
    Date,
    ObjectId,
    Boolean,
    Object,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Date => write!(f, "date"),
            Self::ObjectId => write!(f, "objectId"),
            Self::Boolean => write!(f, "boolean"),
            Self::Object => write!(f, "object"),
        }
    }
}

/// Metadata for one field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Allowed values, in display order.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

impl FieldSchema {
    /// Short type hint shown next to a field name: `(active|disabled)` for
    /// enums, `(date)` otherwise, with a trailing ` *` for required fields.
    pub fn type_label(&self) -> String {
        let base = match &self.allowed {
            Some(values) => format!("({})", values.join("|")),
            None => format!("({})", self.field_type),
        };
        if self.required {
            format!("{} *", base)
        } else {
            base
        }
    }

    /// Hint for the value input of a condition bound to this field.
    pub fn placeholder(&self) -> String {
        if let Some(values) = &self.allowed {
            return format!("Select from: {}", values.join(", "));
        }
        match self.field_type {
            FieldType::String => "Enter text...",
            FieldType::Number => "Enter number...",
            FieldType::Date => "Enter date (YYYY-MM-DD)...",
            FieldType::ObjectId => "Enter ObjectId...",
            FieldType::Boolean => "true or false",
            FieldType::Object => "JSON object...",
        }
        .to_string()
    }

    /// Whether `value` is acceptable for an enum-constrained field.
    /// Fields without an enum accept anything.
    pub fn allows(&self, value: &str) -> bool {
        match &self.allowed {
            Some(values) => value.is_empty() || values.iter().any(|v| v == value),
            None => true,
        }
    }
}

/// A named field definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub schema: FieldSchema,
}

impl FieldDef {
    pub fn display_name(&self) -> String {
        display_name(&self.name)
    }
}

/// Field definitions of one collection, in definition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    name: String,
    fields: Vec<FieldDef>,
}

impl CollectionSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.schema)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// Immutable lookup from collection name to [`CollectionSchema`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaRegistry {
    collections: Vec<CollectionSchema>,
}

impl SchemaRegistry {
    pub fn new(collections: Vec<CollectionSchema>) -> Self {
        Self { collections }
    }

    /// The takedowns dataset as shipped.
    pub fn builtin() -> Self {
        let collections = BUILTIN
            .iter()
            .map(|(name, fields)| {
                let defs = fields
                    .iter()
                    .map(|(field, field_type, required, allowed)| FieldDef {
                        name: (*field).to_string(),
                        schema: FieldSchema {
                            field_type: *field_type,
                            required: *required,
                            allowed: if allowed.is_empty() {
                                None
                            } else {
                                Some(allowed.iter().map(|v| (*v).to_string()).collect())
                            },
                        },
                    })
                    .collect();
                CollectionSchema::new(*name, defs)
            })
            .collect();
        Self { collections }
    }

    /// Parse a registry from JSON shaped like
    /// `{"clients": {"client_name": {"type": "string", "required": true}}}`.
    /// Both collection and field order are kept as written.
    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        let root: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;
        let mut collections = Vec::with_capacity(root.len());

        for (name, body) in root {
            let serde_json::Value::Object(fields) = body else {
                return Err(SchemaError::NotAnObject { collection: name });
            };
            let mut defs = Vec::with_capacity(fields.len());
            for (field, field_body) in fields {
                let schema: FieldSchema =
                    serde_json::from_value(field_body).map_err(|source| SchemaError::Field {
                        collection: name.clone(),
                        field: field.clone(),
                        source,
                    })?;
                defs.push(FieldDef {
                    name: field,
                    schema,
                });
            }
            collections.push(CollectionSchema::new(name, defs));
        }

        Ok(Self { collections })
    }

    pub fn get(&self, collection: &str) -> Option<&CollectionSchema> {
        self.collections.iter().find(|c| c.name == collection)
    }

    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.collections.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

/// `"client_name"` → `"Client Name"`.
pub fn display_name(field: &str) -> String {
    field
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

// =============================================================================
// Built-in table
// =============================================================================

type FieldRow = (&'static str, FieldType, bool, &'static [&'static str]);

use FieldType::{Date, Object, ObjectId, String as Text};

const FINDING_STATUS: &[&str] = &["pending", "reviewed", "takedown_requested", "removed"];

const BUILTIN: &[(&str, &[FieldRow])] = &[
    (
        "clients",
        &[
            ("client_name", Text, true, &[]),
            ("overall_status", Text, true, &["active", "disabled"]),
            ("plan", Text, true, &["Basic", "Premium", "VIP"]),
            (
                "priority",
                Text,
                true,
                &["Low", "Medium", "High", "Highest", "Unconfirmed"],
            ),
            ("customer", Text, true, &[]),
            ("agency", Text, true, &[]),
            ("onboarding", Text, true, &["Complete", "Incomplete"]),
            ("channel_id", Text, false, &[]),
            ("channel_name", Text, false, &[]),
            ("initial_search_status", Text, false, &[]),
            ("gender", Text, false, &[]),
            ("username", Text, false, &[]),
            ("created_by", Text, true, &[]),
            ("created", Date, false, &[]),
            ("last_modified", Date, false, &[]),
            ("search_status", Object, false, &[]),
            ("social_media_links", Object, false, &[]),
            ("search_terms", Object, true, &[]),
            ("channel_details", Object, false, &[]),
            ("_id", ObjectId, false, &[]),
        ],
    ),
    (
        "google_findings",
        &[
            ("client_id", ObjectId, true, &[]),
            ("url", Text, true, &[]),
            ("title", Text, false, &[]),
            ("description", Text, false, &[]),
            ("status", Text, false, FINDING_STATUS),
            ("priority", Text, false, &["Low", "Medium", "High", "Critical"]),
            ("created", Date, false, &[]),
            ("last_modified", Date, false, &[]),
            ("_id", ObjectId, false, &[]),
        ],
    ),
    (
        "colab_links",
        &[
            ("client_id", ObjectId, true, &[]),
            ("url", Text, true, &[]),
            ("title", Text, false, &[]),
            ("status", Text, false, &["active", "inactive", "removed"]),
            ("created", Date, false, &[]),
            ("last_modified", Date, false, &[]),
            ("_id", ObjectId, false, &[]),
        ],
    ),
    (
        "colab_updates",
        &[
            ("link_all_id", ObjectId, true, &[]),
            (
                "update_type",
                Text,
                false,
                &["content_change", "status_change", "removal"],
            ),
            ("description", Text, false, &[]),
            ("created", Date, false, &[]),
            ("_id", ObjectId, false, &[]),
        ],
    ),
    (
        "twitter_findings",
        &[
            ("client_id", ObjectId, true, &[]),
            ("tweet_id", Text, true, &[]),
            ("tweet_url", Text, true, &[]),
            ("content", Text, false, &[]),
            ("author", Text, false, &[]),
            ("status", Text, false, FINDING_STATUS),
            ("created", Date, false, &[]),
            ("last_modified", Date, false, &[]),
            ("_id", ObjectId, false, &[]),
        ],
    ),
    (
        "reddit_data",
        &[
            ("client_id", ObjectId, true, &[]),
            ("post_id", Text, true, &[]),
            ("post_url", Text, true, &[]),
            ("title", Text, false, &[]),
            ("content", Text, false, &[]),
            ("subreddit", Text, false, &[]),
            ("author", Text, false, &[]),
            ("status", Text, false, FINDING_STATUS),
            ("created", Date, false, &[]),
            ("last_modified", Date, false, &[]),
            ("_id", ObjectId, false, &[]),
        ],
    ),
    (
        "excluded_domains",
        &[
            ("domain", Text, true, &[]),
            ("reason", Text, false, &[]),
            ("created", Date, false, &[]),
            ("_id", ObjectId, false, &[]),
        ],
    ),
    (
        "included_domains",
        &[
            ("domain", Text, true, &[]),
            ("priority", Text, false, &["Low", "Medium", "High"]),
            ("created", Date, false, &[]),
            ("_id", ObjectId, false, &[]),
        ],
    ),
    (
        "rejected_google_domains",
        &[
            ("domain", Text, true, &[]),
            ("rejection_reason", Text, false, &[]),
            ("created", Date, false, &[]),
            ("_id", ObjectId, false, &[]),
        ],
    ),
    (
        "delisted_google_domains",
        &[
            ("domain", Text, true, &[]),
            ("delisted_date", Date, false, &[]),
            ("created", Date, false, &[]),
            ("_id", ObjectId, false, &[]),
        ],
    ),
];
