//! Mutation lowering: a mutation table with empty `params` becomes an
//! `INSERT`, a non-empty one an `UPDATE`.

use crate::ast::{Document, Expression, Selector, Table};
use crate::config::Config;
use crate::dialect::Dialect;
use crate::error::{DqlError, ShapeError};
use crate::resolver::Environment;

use super::expr::{compile_expression, compile_scalar, compile_selector_list, CallStack};
use crate::builder::QueryBuilder;

/// Compiles each field assignment of `table`: verify no alias, require a
/// value, resolve it (dropping the field entirely when it's an unresolved
/// `Variable`). Returns `(column, value)` pairs for fields that survive, in
/// source order.
fn compile_field_assignments(
    table: &Table,
    env: &Environment,
    doc: &Document,
    dialect: &dyn Dialect,
    stack: &mut CallStack,
) -> Result<Vec<(String, String)>, DqlError> {
    let mut assignments = Vec::new();
    for field in table.fields() {
        if field.alias.is_some() {
            return Err(ShapeError::AliasInMutation {
                table: table.name.clone(),
                field: field.name.clone(),
            }
            .into());
        }
        let Some(value) = &field.value else {
            return Err(ShapeError::ValueRequired {
                table: table.name.clone(),
                field: field.name.clone(),
            }
            .into());
        };
        if let Some(rendered) = resolve_field_value(value, env, doc, dialect, stack)? {
            assignments.push((field.name.clone(), rendered));
        }
    }
    Ok(assignments)
}

/// Resolves one field's value expression to its emitted SQL, or `None` if
/// it's an unresolved `Variable` (the field is omitted from the statement
/// entirely rather than emitted as `NULL`).
fn resolve_field_value(
    expr: &Expression,
    env: &Environment,
    doc: &Document,
    dialect: &dyn Dialect,
    stack: &mut CallStack,
) -> Result<Option<String>, DqlError> {
    if let Expression::Variable(name) = expr {
        return Ok(match env.get(name) {
            Some(scalar) => Some(compile_scalar(scalar, dialect)),
            None => {
                tracing::debug!(
                    variable = name,
                    "unresolved variable dropped from mutation field assignment"
                );
                None
            }
        });
    }

    let compiled = compile_expression(expr, env, doc, dialect, stack)?;
    // Raw-text and computed expressions are parenthesized as an assignment
    // RHS (needed for things like `CURRENT_TIMESTAMP - INTERVAL '1 week'`);
    // plain literals are not.
    let rendered = if matches!(expr, Expression::Literal(_)) {
        compiled
    } else {
        format!("({compiled})")
    };
    Ok(Some(rendered))
}

/// Lowers a mutation table with no selectors into an `INSERT` statement.
///
/// # Errors
///
/// Returns a [`DqlError`] if a field assignment is malformed (an alias, a
/// missing value), if every field assignment resolves away and none are
/// left to emit, or if a value expression fails to compile.
pub fn lower_insert(
    table: &Table,
    env: &Environment,
    config: &Config,
    doc: &Document,
    dialect: &dyn Dialect,
    stack: &mut CallStack,
) -> Result<String, DqlError> {
    let assignments = compile_field_assignments(table, env, doc, dialect, stack)?;
    if assignments.is_empty() {
        return Err(ShapeError::AtLeastOneFieldRequired {
            table: table.name.clone(),
        }
        .into());
    }

    let mut builder = QueryBuilder::insert(dialect).into_table(table.name.clone());
    for (column, value) in assignments {
        builder = builder.field(column).value(value);
    }
    if let Some(returning) = &config.returning {
        builder = builder.returning(returning);
    }
    Ok(builder.to_string())
}

/// Lowers a mutation table with at least one selector into an `UPDATE`
/// statement.
///
/// # Errors
///
/// Returns a [`DqlError`] if a field assignment is malformed, if no field
/// assignment survives resolution, or if a value or selector expression
/// fails to compile.
pub fn lower_update(
    table: &Table,
    env: &Environment,
    config: &Config,
    doc: &Document,
    dialect: &dyn Dialect,
    stack: &mut CallStack,
) -> Result<String, DqlError> {
    let assignments = compile_field_assignments(table, env, doc, dialect, stack)?;
    if assignments.is_empty() {
        return Err(ShapeError::AtLeastOneFieldRequired {
            table: table.name.clone(),
        }
        .into());
    }

    let selectors: Vec<&Selector> = table.params.iter().collect();
    let where_sql = compile_selector_list(&selectors, env, doc, dialect, stack)?;

    let mut builder = QueryBuilder::update(dialect).table(table.name.clone());
    for (column, value) in assignments {
        builder = builder.set(&column, value);
    }
    builder = builder.where_clause(where_sql);
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
    use crate::ast::{ChildNode, Field, Scalar, SelectorOp};
    use crate::dialect::Postgres;
    use std::collections::HashMap;

    fn env_with(vars: &[(&str, Scalar)]) -> Environment {
        let mut map = HashMap::new();
        for (k, v) in vars {
            map.insert((*k).to_string(), v.clone());
        }
        Environment::build(&map, &[]).unwrap()
    }

    #[test]
    fn insert_with_literals() {
        let table = Table {
            name: "users".to_string(),
            params: vec![],
            children: vec![
                ChildNode::Field(Field {
                    name: "name".to_string(),
                    alias: None,
                    value: Some(Expression::Literal(Scalar::String("John".to_string()))),
                }),
                ChildNode::Field(Field {
                    name: "age".to_string(),
                    alias: None,
                    value: Some(Expression::Literal(Scalar::Integer(45))),
                }),
            ],
            delete: false,
        };
        let doc = Document::default();
        let mut stack = Vec::new();
        let sql = lower_insert(
            &table,
            &env_with(&[]),
            &Config::default(),
            &doc,
            &Postgres,
            &mut stack,
        )
        .unwrap();
        assert_eq!(sql, "INSERT INTO users (name, age) VALUES ('John', 45)");
    }

    #[test]
    fn update_with_variables_and_where() {
        let table = Table {
            name: "users".to_string(),
            params: vec![Selector {
                lhs: "id".to_string(),
                op: SelectorOp::Eq,
                rhs: Expression::Variable("id".to_string()),
            }],
            children: vec![
                ChildNode::Field(Field {
                    name: "name".to_string(),
                    alias: None,
                    value: Some(Expression::Variable("name".to_string())),
                }),
                ChildNode::Field(Field {
                    name: "age".to_string(),
                    alias: None,
                    value: Some(Expression::Variable("age".to_string())),
                }),
            ],
            delete: false,
        };
        let doc = Document::default();
        let mut stack = Vec::new();
        let env = env_with(&[
            ("id", Scalar::Integer(9)),
            ("name", Scalar::String("John".to_string())),
            ("age", Scalar::Integer(45)),
        ]);
        let sql =
            lower_update(&table, &env, &Config::default(), &doc, &Postgres, &mut stack).unwrap();
        assert_eq!(
            sql,
            "UPDATE users SET name = 'John', age = 45 WHERE (id = 9)"
        );
    }

    #[test]
    fn insert_with_all_fields_unresolved_fails() {
        let table = Table {
            name: "users".to_string(),
            params: vec![],
            children: vec![ChildNode::Field(Field {
                name: "name".to_string(),
                alias: None,
                value: Some(Expression::Variable("missing".to_string())),
            })],
            delete: false,
        };
        let doc = Document::default();
        let mut stack = Vec::new();
        let err = lower_insert(
            &table,
            &env_with(&[]),
            &Config::default(),
            &doc,
            &Postgres,
            &mut stack,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DqlError::Shape(ShapeError::AtLeastOneFieldRequired { .. })
        ));
    }

    #[test]
    fn alias_in_mutation_field_is_rejected() {
        let table = Table {
            name: "users".to_string(),
            params: vec![],
            children: vec![ChildNode::Field(Field {
                name: "name".to_string(),
                alias: Some("n".to_string()),
                value: Some(Expression::Literal(Scalar::String("John".to_string()))),
            })],
            delete: false,
        };
        let doc = Document::default();
        let mut stack = Vec::new();
        let err = lower_insert(
            &table,
            &env_with(&[]),
            &Config::default(),
            &doc,
            &Postgres,
            &mut stack,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DqlError::Shape(ShapeError::AliasInMutation { .. })
        ));
    }
}
