//! Flag syntax for building an advanced query on the command line.
//!
//! - `--where "FIELD OP [VALUE]"`: value is the rest of the line, so it may
//!   contain spaces. List operators take `a, b, c`.
//! - `--join "COLLECTION:LOCAL:FOREIGN:AS"`
//! - `--sort FIELD[:asc|desc]`

use anyhow::{anyhow, bail, Result};

use tdc_core::query::{ConditionPatch, Direction, JoinPatch, Operator, SortPatch};
use tdc_core::QueryEditor;

pub fn parse_where(raw: &str) -> Result<ConditionPatch> {
    let raw = raw.trim();
    let mut tokens = raw.split_whitespace();
    let Some(field) = tokens.next() else {
        bail!("empty --where clause");
    };
    let op = tokens
        .next()
        .ok_or_else(|| anyhow!("--where '{}' is missing an operator", raw))?;
    let operator: Operator = op.parse()?;

    // Everything after the operator token, inner spacing kept.
    let rest = raw.strip_prefix(field).unwrap_or_default().trim_start();
    let value = rest.strip_prefix(op).unwrap_or_default().trim();
    Ok(ConditionPatch {
        field: Some(field.to_string()),
        operator: Some(operator),
        value: (!value.is_empty()).then(|| value.to_string()),
        values: None,
    })
}

pub fn parse_join(raw: &str) -> Result<JoinPatch> {
    let parts: Vec<&str> = raw.split(':').map(str::trim).collect();
    let [collection, local, foreign, alias] = parts.as_slice() else {
        bail!("--join expects COLLECTION:LOCAL:FOREIGN:AS, got '{}'", raw);
    };
    Ok(JoinPatch {
        collection: Some(collection.to_string()),
        local_field: Some(local.to_string()),
        foreign_field: Some(foreign.to_string()),
        alias: Some(alias.to_string()),
    })
}

pub fn parse_sort(raw: &str) -> Result<SortPatch> {
    let (field, direction) = match raw.split_once(':') {
        Some((field, dir)) => (field, dir.parse::<Direction>().map_err(|e| anyhow!(e))?),
        None => (raw, Direction::Asc),
    };
    Ok(SortPatch {
        field: Some(field.trim().to_string()),
        direction: Some(direction),
    })
}

/// Append one clause per flag to the editor's query. A clause the editor
/// rejects is taken back out again and reported as an error, so nothing
/// half-built is ever sent.
pub fn apply_clauses(
    editor: &mut QueryEditor,
    conditions: &[String],
    joins: &[String],
    sort: &[String],
) -> Result<()> {
    for raw in conditions {
        let patch = parse_where(raw)?;
        editor.add_condition();
        let index = editor.query().conditions.len() - 1;
        if let Err(e) = editor.update_condition(index, patch) {
            editor.remove_condition(index)?;
            bail!("--where '{}': {}", raw, e);
        }
    }
    for raw in joins {
        let patch = parse_join(raw)?;
        editor.add_join();
        let index = editor.query().joins.len() - 1;
        if let Err(e) = editor.update_join(index, patch) {
            editor.remove_join(index)?;
            bail!("--join '{}': {}", raw, e);
        }
    }
    for raw in sort {
        let patch = parse_sort(raw)?;
        editor.add_sort();
        let index = editor.query().sort.len() - 1;
        if let Err(e) = editor.update_sort(index, patch) {
            editor.remove_sort(index)?;
            bail!("--sort '{}': {}", raw, e);
        }
    }
    for (kind, index) in editor.query().unselected_clauses() {
        tracing::warn!("{} {} has no field selected", kind, index);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tdc_core::query::{Condition, Join, ListOp, ScalarOp, SortClause};
    use tdc_core::{Query, SchemaRegistry};

    fn editor(collection: &str) -> QueryEditor {
        QueryEditor::with_query(Arc::new(SchemaRegistry::builtin()), Query::new(collection))
    }

    #[test]
    fn test_parse_where_keeps_spaces_in_value() {
        let patch = parse_where("client_name contains Claire Stone").unwrap();
        assert_eq!(patch.field.as_deref(), Some("client_name"));
        assert_eq!(patch.operator, Some(Operator::Contains));
        assert_eq!(patch.value.as_deref(), Some("Claire Stone"));

        let patch = parse_where("title exists").unwrap();
        assert_eq!(patch.operator, Some(Operator::Exists));
        assert!(patch.value.is_none());

        let patch = parse_where("  status   equals   takedown  requested ").unwrap();
        assert_eq!(patch.field.as_deref(), Some("status"));
        assert_eq!(patch.operator, Some(Operator::Equals));
        assert_eq!(patch.value.as_deref(), Some("takedown  requested"));

        assert!(parse_where("title").is_err());
        assert!(parse_where("title like x").is_err());
        assert!(parse_where("   ").is_err());
    }

    #[test]
    fn test_parse_join_and_sort() {
        let join = parse_join("clients:client_id:_id:client").unwrap();
        assert_eq!(join.collection.as_deref(), Some("clients"));
        assert_eq!(join.alias.as_deref(), Some("client"));
        assert!(parse_join("clients:client_id").is_err());

        let sort = parse_sort("created:desc").unwrap();
        assert_eq!(sort.direction, Some(Direction::Desc));
        assert_eq!(parse_sort("created").unwrap().direction, Some(Direction::Asc));
        assert!(parse_sort("created:sideways").is_err());
    }

    #[test]
    fn test_apply_clauses() {
        let mut editor = editor("google_findings");
        apply_clauses(
            &mut editor,
            &["status equals removed".into(), "priority in High, Critical".into()],
            &["clients:client_id:_id:client".into()],
            &["created:desc".into()],
        )
        .unwrap();

        let q = editor.query();
        assert_eq!(
            q.conditions,
            vec![
                Condition::scalar("status", ScalarOp::Equals, "removed"),
                Condition::list("priority", ListOp::In, vec!["High".into(), "Critical".into()]),
            ]
        );
        assert_eq!(q.joins, vec![Join::new("clients", "client_id", "_id", "client")]);
        assert_eq!(q.sort, vec![SortClause::new("created", Direction::Desc)]);
    }

    #[test]
    fn test_unknown_field_is_left_unselected() {
        let mut editor = editor("clients");
        apply_clauses(&mut editor, &["nope equals x".into()], &[], &[]).unwrap();
        assert!(editor.query().conditions[0].is_unselected());
    }

    #[test]
    fn test_rejected_condition_leaves_query_untouched() {
        let mut editor = editor("clients");
        apply_clauses(&mut editor, &["plan equals VIP".into()], &[], &[]).unwrap();

        let err = apply_clauses(&mut editor, &["plan equals Platinum".into()], &[], &[])
            .unwrap_err();
        assert!(err.to_string().contains("Platinum"));
        assert_eq!(
            editor.query().conditions,
            vec![Condition::scalar("plan", ScalarOp::Equals, "VIP")]
        );
    }
}
