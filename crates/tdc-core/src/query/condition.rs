//! # Conditions
//!
//! A condition is one filter predicate over a collection field. Its payload
//! depends on the operator class, so the type is a tagged union whose
//! variant is fixed by the operator: scalar operators carry a `value`, list
//! operators (`in`, `not_in`, `between`) carry `values`, and existence
//! operators carry nothing.
//!
//! On the wire a condition is the flat object the Query Service expects:
//! `{"field", "operator", "value"}`, `{"field", "operator", "values"}` or
//! `{"field", "operator"}`.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::split_values;

// =============================================================================
// Operators
// =============================================================================

/// Every operator the Query Service understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Regex,
    In,
    NotIn,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    Exists,
    NotExists,
}

/// Payload shape required by an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorClass {
    Scalar,
    List,
    Existence,
}

impl Operator {
    /// Picker order.
    pub const ALL: [Operator; 16] = [
        Self::Equals,
        Self::NotEquals,
        Self::Contains,
        Self::NotContains,
        Self::StartsWith,
        Self::EndsWith,
        Self::Regex,
        Self::In,
        Self::NotIn,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Between,
        Self::Exists,
        Self::NotExists,
    ];

    pub fn class(self) -> OperatorClass {
        match self {
            Self::In | Self::NotIn | Self::Between => OperatorClass::List,
            Self::Exists | Self::NotExists => OperatorClass::Existence,
            _ => OperatorClass::Scalar,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Regex => "regex",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Between => "between",
            Self::Exists => "exists",
            Self::NotExists => "not_exists",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Equals => "Equals",
            Self::NotEquals => "Not Equals",
            Self::Contains => "Contains",
            Self::NotContains => "Not Contains",
            Self::StartsWith => "Starts With",
            Self::EndsWith => "Ends With",
            Self::Regex => "Regex",
            Self::In => "In",
            Self::NotIn => "Not In",
            Self::Gt => "Greater Than",
            Self::Gte => "Greater Than or Equal",
            Self::Lt => "Less Than",
            Self::Lte => "Less Than or Equal",
            Self::Between => "Between",
            Self::Exists => "Exists",
            Self::NotExists => "Not Exists",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised operator name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator '{0}'")]
pub struct ParseOperatorError(pub String);

impl FromStr for Operator {
    type Err = ParseOperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == wanted)
            .ok_or_else(|| ParseOperatorError(s.to_string()))
    }
}

/// Operators that compare against a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarOp {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Regex,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Operators that take an ordered list of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOp {
    In,
    NotIn,
    Between,
}

/// Operators that only test for presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistenceOp {
    Exists,
    NotExists,
}

impl From<ScalarOp> for Operator {
    fn from(op: ScalarOp) -> Self {
        match op {
            ScalarOp::Equals => Self::Equals,
            ScalarOp::NotEquals => Self::NotEquals,
            ScalarOp::Contains => Self::Contains,
            ScalarOp::NotContains => Self::NotContains,
            ScalarOp::StartsWith => Self::StartsWith,
            ScalarOp::EndsWith => Self::EndsWith,
            ScalarOp::Regex => Self::Regex,
            ScalarOp::Gt => Self::Gt,
            ScalarOp::Gte => Self::Gte,
            ScalarOp::Lt => Self::Lt,
            ScalarOp::Lte => Self::Lte,
        }
    }
}

impl From<ListOp> for Operator {
    fn from(op: ListOp) -> Self {
        match op {
            ListOp::In => Self::In,
            ListOp::NotIn => Self::NotIn,
            ListOp::Between => Self::Between,
        }
    }
}

impl From<ExistenceOp> for Operator {
    fn from(op: ExistenceOp) -> Self {
        match op {
            ExistenceOp::Exists => Self::Exists,
            ExistenceOp::NotExists => Self::NotExists,
        }
    }
}

/// An [`Operator`] split by class.
enum Classified {
    Scalar(ScalarOp),
    List(ListOp),
    Existence(ExistenceOp),
}

fn classify(op: Operator) -> Classified {
    match op {
        Operator::Equals => Classified::Scalar(ScalarOp::Equals),
        Operator::NotEquals => Classified::Scalar(ScalarOp::NotEquals),
        Operator::Contains => Classified::Scalar(ScalarOp::Contains),
        Operator::NotContains => Classified::Scalar(ScalarOp::NotContains),
        Operator::StartsWith => Classified::Scalar(ScalarOp::StartsWith),
        Operator::EndsWith => Classified::Scalar(ScalarOp::EndsWith),
        Operator::Regex => Classified::Scalar(ScalarOp::Regex),
        Operator::Gt => Classified::Scalar(ScalarOp::Gt),
        Operator::Gte => Classified::Scalar(ScalarOp::Gte),
        Operator::Lt => Classified::Scalar(ScalarOp::Lt),
        Operator::Lte => Classified::Scalar(ScalarOp::Lte),
        Operator::In => Classified::List(ListOp::In),
        Operator::NotIn => Classified::List(ListOp::NotIn),
        Operator::Between => Classified::List(ListOp::Between),
        Operator::Exists => Classified::Existence(ExistenceOp::Exists),
        Operator::NotExists => Classified::Existence(ExistenceOp::NotExists),
    }
}

// =============================================================================
// Condition
// =============================================================================

/// One filter predicate. An empty `field` means "unselected".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireCondition", from = "WireCondition")]
pub enum Condition {
    Scalar {
        field: String,
        operator: ScalarOp,
        value: String,
    },
    List {
        field: String,
        operator: ListOp,
        values: Vec<String>,
    },
    Existence {
        field: String,
        operator: ExistenceOp,
    },
}

impl Default for Condition {
    /// `{field: "", operator: equals, value: ""}`
    fn default() -> Self {
        Self::Scalar {
            field: String::new(),
            operator: ScalarOp::Equals,
            value: String::new(),
        }
    }
}

impl Condition {
    /// A condition with an empty payload of the shape `operator` requires.
    pub fn new(field: impl Into<String>, operator: Operator) -> Self {
        let field = field.into();
        match classify(operator) {
            Classified::Scalar(operator) => Self::Scalar {
                field,
                operator,
                value: String::new(),
            },
            Classified::List(operator) => Self::List {
                field,
                operator,
                values: Vec::new(),
            },
            Classified::Existence(operator) => Self::Existence { field, operator },
        }
    }

    pub fn scalar(field: impl Into<String>, operator: ScalarOp, value: impl Into<String>) -> Self {
        Self::Scalar {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn list(field: impl Into<String>, operator: ListOp, values: Vec<String>) -> Self {
        Self::List {
            field: field.into(),
            operator,
            values,
        }
    }

    pub fn existence(field: impl Into<String>, operator: ExistenceOp) -> Self {
        Self::Existence {
            field: field.into(),
            operator,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Scalar { field, .. } | Self::List { field, .. } | Self::Existence { field, .. } => {
                field
            }
        }
    }

    pub fn operator(&self) -> Operator {
        match self {
            Self::Scalar { operator, .. } => (*operator).into(),
            Self::List { operator, .. } => (*operator).into(),
            Self::Existence { operator, .. } => (*operator).into(),
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn values(&self) -> Option<&[String]> {
        match self {
            Self::List { values, .. } => Some(values),
            _ => None,
        }
    }

    pub fn is_unselected(&self) -> bool {
        self.field().is_empty()
    }

    pub(crate) fn set_field(&mut self, new_field: String) {
        match self {
            Self::Scalar { field, .. } | Self::List { field, .. } | Self::Existence { field, .. } => {
                *field = new_field
            }
        }
    }

    /// Switch operator, carrying the payload across classes: a scalar value
    /// becomes a split list, a list becomes its comma-joined text, and an
    /// existence test keeps no payload.
    pub fn with_operator(self, operator: Operator) -> Self {
        let (field, text, list) = match self {
            Self::Scalar { field, value, .. } => (field, Some(value), None),
            Self::List { field, values, .. } => (field, None, Some(values)),
            Self::Existence { field, .. } => (field, None, None),
        };

        match classify(operator) {
            Classified::Scalar(operator) => Self::Scalar {
                field,
                operator,
                value: text
                    .or_else(|| list.map(|values| values.join(", ")))
                    .unwrap_or_default(),
            },
            Classified::List(operator) => Self::List {
                field,
                operator,
                values: list
                    .or_else(|| text.map(|value| split_values(&value)))
                    .unwrap_or_default(),
            },
            Classified::Existence(operator) => Self::Existence { field, operator },
        }
    }
}

/// Partial update for a condition; `None` leaves the part untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionPatch {
    pub field: Option<String>,
    pub operator: Option<Operator>,
    /// Scalar value. For list operators the text is split like
    /// [`split_values`].
    pub value: Option<String>,
    pub values: Option<Vec<String>>,
}

impl ConditionPatch {
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::default()
        }
    }

    pub fn operator(operator: Operator) -> Self {
        Self {
            operator: Some(operator),
            ..Self::default()
        }
    }

    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }
}

// =============================================================================
// Wire shape
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireCondition {
    #[serde(default)]
    field: String,
    #[serde(default)]
    operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<Vec<serde_json::Value>>,
}

impl From<Condition> for WireCondition {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Scalar {
                field,
                operator,
                value,
            } => Self {
                field,
                operator: operator.into(),
                value: Some(serde_json::Value::String(value)),
                values: None,
            },
            Condition::List {
                field,
                operator,
                values,
            } => Self {
                field,
                operator: operator.into(),
                value: None,
                values: Some(values.into_iter().map(serde_json::Value::String).collect()),
            },
            Condition::Existence { field, operator } => Self {
                field,
                operator: operator.into(),
                value: None,
                values: None,
            },
        }
    }
}

/// Templates from the service are loosely typed: numbers and booleans are
/// taken as their text, a list operator given a `value` string splits it.
impl From<WireCondition> for Condition {
    fn from(wire: WireCondition) -> Self {
        let WireCondition {
            field,
            operator,
            value,
            values,
        } = wire;

        match classify(operator) {
            Classified::Scalar(operator) => {
                let value = match (value, values) {
                    (Some(v), _) => scalar_text(&v),
                    (None, Some(list)) => list.iter().map(scalar_text).collect::<Vec<_>>().join(", "),
                    (None, None) => String::new(),
                };
                Self::Scalar {
                    field,
                    operator,
                    value,
                }
            }
            Classified::List(operator) => {
                let values = match (values, value) {
                    (Some(list), _) => list.iter().map(scalar_text).collect(),
                    (None, Some(serde_json::Value::Array(list))) => {
                        list.iter().map(scalar_text).collect()
                    }
                    (None, Some(v)) => split_values(&scalar_text(&v)),
                    (None, None) => Vec::new(),
                };
                Self::List {
                    field,
                    operator,
                    values,
                }
            }
            Classified::Existence(operator) => Self::Existence { field, operator },
        }
    }
}

fn scalar_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_classes() {
        let lists: Vec<Operator> = Operator::ALL
            .iter()
            .copied()
            .filter(|op| op.class() == OperatorClass::List)
            .collect();
        assert_eq!(lists, vec![Operator::In, Operator::NotIn, Operator::Between]);
        assert_eq!(Operator::Exists.class(), OperatorClass::Existence);
        assert_eq!(Operator::Regex.class(), OperatorClass::Scalar);
    }

    #[test]
    fn test_operator_from_str() {
        assert_eq!("not_in".parse::<Operator>().unwrap(), Operator::NotIn);
        assert_eq!(" GTE ".parse::<Operator>().unwrap(), Operator::Gte);
        assert!("like".parse::<Operator>().is_err());
    }

    #[test]
    fn test_default_condition_shape() {
        let value = serde_json::to_value(Condition::default()).unwrap();
        assert_eq!(value, json!({"field": "", "operator": "equals", "value": ""}));
    }

    #[test]
    fn test_wire_shapes_per_class() {
        let list = Condition::list("status", ListOp::In, vec!["a".into(), "b".into()]);
        assert_eq!(
            serde_json::to_value(&list).unwrap(),
            json!({"field": "status", "operator": "in", "values": ["a", "b"]})
        );

        let exists = Condition::existence("title", ExistenceOp::NotExists);
        assert_eq!(
            serde_json::to_value(&exists).unwrap(),
            json!({"field": "title", "operator": "not_exists"})
        );
    }

    #[test]
    fn test_loose_template_values() {
        let c: Condition =
            serde_json::from_value(json!({"field": "score", "operator": "gt", "value": 5})).unwrap();
        assert_eq!(c.value(), Some("5"));

        let c: Condition = serde_json::from_value(
            json!({"field": "status", "operator": "in", "value": "pending, removed"}),
        )
        .unwrap();
        assert_eq!(c.values().unwrap(), ["pending", "removed"]);

        let c: Condition = serde_json::from_value(
            json!({"field": "url", "operator": "exists", "value": "ignored"}),
        )
        .unwrap();
        assert_eq!(c, Condition::existence("url", ExistenceOp::Exists));
    }

    #[test]
    fn test_missing_operator_defaults_to_equals() {
        let c: Condition = serde_json::from_value(json!({"field": "plan", "value": "VIP"})).unwrap();
        assert_eq!(c.operator(), Operator::Equals);
        assert_eq!(c.value(), Some("VIP"));
    }

    #[test]
    fn test_operator_switch_carries_payload() {
        let c = Condition::scalar("status", ScalarOp::Equals, "a, b,,c");
        let c = c.with_operator(Operator::NotIn);
        assert_eq!(c.values().unwrap(), ["a", "b", "c"]);

        let c = c.with_operator(Operator::Contains);
        assert_eq!(c.value(), Some("a, b, c"));

        let c = c.with_operator(Operator::Exists);
        assert_eq!(c.value(), None);
        assert_eq!(c.values(), None);
        assert_eq!(c.field(), "status");
    }
}
