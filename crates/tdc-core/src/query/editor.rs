//! # Query Editor
//!
//! Owns one advanced [`Query`] and applies edits to it. Every field name
//! that reaches the query goes through the schema registry: a name the
//! collection does not define is stored as the empty "unselected" field.
//! Collections the registry does not know are passed through unchecked.
//!
//! Edits addressed at a position that does not exist change nothing and
//! come back as [`EditError::IndexOutOfRange`]. Front ends log them and
//! carry on.
//!
//! Switching collection keeps every clause. Field references that the new
//! collection does not define (condition and sort fields, join local
//! fields) become unselected.

use std::sync::Arc;

use super::clause::{Join, JoinPatch, SortClause, SortPatch};
use super::condition::{Condition, ConditionPatch, OperatorClass};
use super::{parse_limit_input, parse_page_input, split_values, Query};
use crate::error::{ClauseKind, EditError};
use crate::schema::SchemaRegistry;
use crate::templates::QueryTemplate;

pub struct QueryEditor {
    registry: Arc<SchemaRegistry>,
    query: Query,
}

impl QueryEditor {
    /// Fresh query on the default collection.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            query: Query::default(),
        }
    }

    /// Adopt an existing query (e.g. one read from a file). Field
    /// references are re-bound against the registry.
    pub fn with_query(registry: Arc<SchemaRegistry>, query: Query) -> Self {
        let mut editor = Self { registry, query };
        editor.rebind_all();
        editor
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn into_query(self) -> Query {
        self.query
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    // -------------------------------------------------------------------------
    // Top-level fields
    // -------------------------------------------------------------------------

    pub fn set_collection(&mut self, name: impl Into<String>) {
        self.query.collection = name.into();
        self.rebind_all();
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.query.search = Some(text.into());
    }

    pub fn set_select(&mut self, fields: Vec<String>) {
        self.query.select = fields.into_iter().filter(|f| !f.is_empty()).collect();
    }

    pub fn set_page(&mut self, page: u32) {
        self.query.page = page.max(1);
    }

    pub fn set_page_input(&mut self, raw: &str) {
        self.query.page = parse_page_input(raw);
    }

    pub fn set_limit_input(&mut self, raw: &str) {
        self.query.limit = parse_limit_input(raw);
    }

    /// Replace the whole query with a template. Missing lists become empty;
    /// paging and search start over.
    pub fn load_template(&mut self, template: &QueryTemplate) {
        self.query = template.to_query();
        self.rebind_all();
    }

    // -------------------------------------------------------------------------
    // Conditions
    // -------------------------------------------------------------------------

    pub fn add_condition(&mut self) -> &Condition {
        self.query.conditions.push(Condition::default());
        &self.query.conditions[self.query.conditions.len() - 1]
    }

    pub fn update_condition(&mut self, index: usize, patch: ConditionPatch) -> Result<(), EditError> {
        let current = self.condition_at(index)?.clone();
        let mut next = match patch.operator {
            Some(op) if op != current.operator() => current.with_operator(op),
            _ => current,
        };

        if let Some(field) = patch.field {
            let field = self.bind_field(&self.query.collection, field);
            next.set_field(field);
        }

        if let Some(text) = patch.value {
            next = match next {
                Condition::Scalar {
                    field, operator, ..
                } => Condition::Scalar {
                    field,
                    operator,
                    value: text,
                },
                Condition::List {
                    field, operator, ..
                } => Condition::List {
                    field,
                    operator,
                    values: split_values(&text),
                },
                existence @ Condition::Existence { .. } => existence,
            };
        }

        if let Some(values) = patch.values {
            if let Condition::List {
                field, operator, ..
            } = next
            {
                next = Condition::List {
                    field,
                    operator,
                    values,
                };
            }
        }

        // Whatever changed, the stored value must suit the resulting field.
        self.check_condition(&next)?;
        self.query.conditions[index] = next;
        Ok(())
    }

    /// Store comma-separated text as the value list of a list-operator
    /// condition.
    pub fn set_condition_values(&mut self, index: usize, text: &str) -> Result<(), EditError> {
        let condition = self.condition_at(index)?;
        if condition.operator().class() != OperatorClass::List {
            return Err(EditError::NotAListOperator { index });
        }
        self.update_condition(
            index,
            ConditionPatch {
                values: Some(split_values(text)),
                ..ConditionPatch::default()
            },
        )
    }

    pub fn remove_condition(&mut self, index: usize) -> Result<Condition, EditError> {
        self.condition_at(index)?;
        Ok(self.query.conditions.remove(index))
    }

    // -------------------------------------------------------------------------
    // Joins
    // -------------------------------------------------------------------------

    pub fn add_join(&mut self) -> &Join {
        self.query.joins.push(Join::default());
        &self.query.joins[self.query.joins.len() - 1]
    }

    pub fn update_join(&mut self, index: usize, patch: JoinPatch) -> Result<(), EditError> {
        let mut next = self.join_at(index)?.clone();

        if let Some(collection) = patch.collection {
            next.collection = collection;
            let foreign = std::mem::take(&mut next.foreign_field);
            next.foreign_field = self.bind_field(&next.collection, foreign);
        }
        if let Some(local) = patch.local_field {
            next.local_field = self.bind_field(&self.query.collection, local);
        }
        if let Some(foreign) = patch.foreign_field {
            next.foreign_field = self.bind_field(&next.collection, foreign);
        }
        if let Some(alias) = patch.alias {
            next.alias = alias;
        }

        self.query.joins[index] = next;
        Ok(())
    }

    pub fn remove_join(&mut self, index: usize) -> Result<Join, EditError> {
        self.join_at(index)?;
        Ok(self.query.joins.remove(index))
    }

    // -------------------------------------------------------------------------
    // Sort
    // -------------------------------------------------------------------------

    pub fn add_sort(&mut self) -> &SortClause {
        self.query.sort.push(SortClause::default());
        &self.query.sort[self.query.sort.len() - 1]
    }

    pub fn update_sort(&mut self, index: usize, patch: SortPatch) -> Result<(), EditError> {
        let mut next = self.sort_at(index)?.clone();
        if let Some(field) = patch.field {
            next.field = self.bind_field(&self.query.collection, field);
        }
        if let Some(direction) = patch.direction {
            next.direction = direction;
        }
        self.query.sort[index] = next;
        Ok(())
    }

    pub fn remove_sort(&mut self, index: usize) -> Result<SortClause, EditError> {
        self.sort_at(index)?;
        Ok(self.query.sort.remove(index))
    }

    // -------------------------------------------------------------------------
    // Schema binding
    // -------------------------------------------------------------------------

    fn bind_field(&self, collection: &str, field: String) -> String {
        match self.registry.get(collection) {
            Some(schema) if !schema.contains(&field) => String::new(),
            _ => field,
        }
    }

    fn check_allowed(&self, field: &str, value: &str) -> Result<(), EditError> {
        let allowed = self
            .registry
            .get(&self.query.collection)
            .and_then(|schema| schema.field(field))
            .map_or(true, |f| f.allows(value));
        if allowed {
            Ok(())
        } else {
            Err(EditError::ValueNotAllowed {
                field: field.to_string(),
                value: value.to_string(),
            })
        }
    }

    fn check_condition(&self, condition: &Condition) -> Result<(), EditError> {
        match condition {
            Condition::Scalar { field, value, .. } => self.check_allowed(field, value),
            Condition::List { field, values, .. } => values
                .iter()
                .try_for_each(|value| self.check_allowed(field, value)),
            Condition::Existence { .. } => Ok(()),
        }
    }

    fn rebind_all(&mut self) {
        let collection = self.query.collection.clone();

        let mut conditions = std::mem::take(&mut self.query.conditions);
        for condition in &mut conditions {
            let field = condition.field().to_string();
            condition.set_field(self.bind_field(&collection, field));
        }
        self.query.conditions = conditions;

        let mut joins = std::mem::take(&mut self.query.joins);
        for join in &mut joins {
            join.local_field = self.bind_field(&collection, std::mem::take(&mut join.local_field));
            join.foreign_field =
                self.bind_field(&join.collection, std::mem::take(&mut join.foreign_field));
        }
        self.query.joins = joins;

        let mut sort = std::mem::take(&mut self.query.sort);
        for clause in &mut sort {
            clause.field = self.bind_field(&collection, std::mem::take(&mut clause.field));
        }
        self.query.sort = sort;
    }

    fn condition_at(&self, index: usize) -> Result<&Condition, EditError> {
        let len = self.query.conditions.len();
        self.query
            .conditions
            .get(index)
            .ok_or(EditError::IndexOutOfRange {
                kind: ClauseKind::Condition,
                index,
                len,
            })
    }

    fn join_at(&self, index: usize) -> Result<&Join, EditError> {
        let len = self.query.joins.len();
        self.query.joins.get(index).ok_or(EditError::IndexOutOfRange {
            kind: ClauseKind::Join,
            index,
            len,
        })
    }

    fn sort_at(&self, index: usize) -> Result<&SortClause, EditError> {
        let len = self.query.sort.len();
        self.query.sort.get(index).ok_or(EditError::IndexOutOfRange {
            kind: ClauseKind::Sort,
            index,
            len,
        })
    }
}
