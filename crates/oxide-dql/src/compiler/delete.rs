//! Delete lowering:
//! `DELETE FROM <name> [joins] WHERE (<selectors>) [ORDER BY ...] [LIMIT ...] [RETURNING ...]`.
//!
//! Joins reuse the query processor's join lowering. The resulting
//! `DELETE FROM t INNER JOIN (...) ...` shape isn't standard SQL for most
//! dialects, but is preserved as intentional observable output rather than
//! rewritten into a dialect-correct form; flagged in DESIGN.md.

use crate::ast::{Document, Selector, Table};
use crate::builder::QueryBuilder;
use crate::config::Config;
use crate::dialect::Dialect;
use crate::error::{DqlError, ShapeError};
use crate::resolver::Environment;

use super::expr::{compile_selector_list, CallStack};
use super::query::lower_join;

/// Lowers a table prefixed with `-` into a `DELETE` statement.
///
/// # Errors
///
/// Returns a [`DqlError`] if the table has no selectors, carries a
/// non-join field child, or a join/selector expression fails to compile.
pub fn lower(
    table: &Table,
    env: &Environment,
    config: &Config,
    doc: &Document,
    dialect: &dyn Dialect,
    stack: &mut CallStack,
) -> Result<String, DqlError> {
    if table.params.is_empty() {
        return Err(ShapeError::DeleteRequiresSelector {
            table: table.name.clone(),
        }
        .into());
    }
    if table.fields().next().is_some() {
        return Err(ShapeError::FieldsNotAllowedInDelete {
            table: table.name.clone(),
        }
        .into());
    }

    let mut builder = QueryBuilder::delete(dialect).from(table.name.clone());
    for join in table.joins() {
        builder = builder.join(lower_join(&table.name, join, env, doc, dialect, stack)?);
    }

    let selectors: Vec<&Selector> = table.params.iter().collect();
    builder = builder.where_clause(compile_selector_list(&selectors, env, doc, dialect, stack)?);

    if let Some(order_by) = &config.order_by {
        builder = builder.order(order_by, config.descending);
    }
    if let Some(limit) = config.limit {
        builder = builder.limit(limit);
    }
    if let Some(returning) = &config.returning {
        builder = builder.returning(returning);
    }
    Ok(builder.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expression, Scalar, SelectorOp};
    use crate::dialect::Postgres;
    use std::collections::HashMap;

    #[test]
    fn delete_with_order_limit_and_variable() {
        let table = Table {
            name: "users".to_string(),
            params: vec![Selector {
                lhs: "name".to_string(),
                op: SelectorOp::Eq,
                rhs: Expression::Variable("name".to_string()),
            }],
            children: vec![],
            delete: true,
        };
        let doc = Document::default();
        let mut stack = Vec::new();
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), Scalar::String("Tyler".to_string()));
        let env = Environment::build(&vars, &[]).unwrap();
        let config = Config {
            limit: Some(1),
            order_by: Some("name".to_string()),
            descending: true,
            ..Config::default()
        };
        let sql = lower(&table, &env, &config, &doc, &Postgres, &mut stack).unwrap();
        assert_eq!(
            sql,
            "DELETE FROM users WHERE (name = 'Tyler') ORDER BY name DESC LIMIT 1"
        );
    }

    #[test]
    fn delete_without_selector_fails() {
        let table = Table {
            name: "users".to_string(),
            params: vec![],
            children: vec![],
            delete: true,
        };
        let doc = Document::default();
        let mut stack = Vec::new();
        let err = lower(
            &table,
            &Environment::default(),
            &Config::default(),
            &doc,
            &Postgres,
            &mut stack,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DqlError::Shape(ShapeError::DeleteRequiresSelector { .. })
        ));
    }
}
