//! Operation dispatcher and the `compile` entry point.
//!
//! Per top-level operation, classifies each of its tables: `DELETE` when
//! `delete = true`, otherwise `SELECT` for a query operation or
//! `INSERT`/`UPDATE` for a mutation operation depending on whether it
//! carries selectors, and delegates to the matching lowering module.

pub mod delete;
pub mod expr;
pub mod mutation;
pub mod query;

use crate::ast::{Document, Operation, OperationKind, Table};
use crate::config::{Config, Flavor};
use crate::dialect::{self, Dialect};
use crate::error::{DqlError, ShapeError};
use crate::parser::Parser;
use crate::resolver::Environment;

use expr::CallStack;

/// Compiles `source` into one SQL string per top-level table, in document
/// order. A mutation operation with several top-level tables produces
/// several statements, one per table; most operations in practice declare
/// exactly one.
///
/// # Errors
///
/// Returns a [`DqlError`] if `source` fails to parse, a variable
/// declaration or table violates a structural invariant, or lowering an
/// operation fails (e.g. a missing required variable, or an unresolvable
/// cross-operation query call).
#[tracing::instrument(skip(source, config), fields(flavor = ?flavor))]
pub fn compile(source: &str, flavor: Flavor, config: &Config) -> Result<Vec<String>, DqlError> {
    let document = Parser::parse_document(source)?;
    let dialect = dialect::for_flavor(flavor);
    compile_document(&document, dialect.as_ref(), config)
}

fn compile_document(
    document: &Document,
    dialect: &dyn Dialect,
    config: &Config,
) -> Result<Vec<String>, DqlError> {
    let mut outputs = Vec::new();
    for operation in &document.operations {
        outputs.extend(compile_operation(operation, document, dialect, config)?);
    }
    Ok(outputs)
}

#[tracing::instrument(skip_all, fields(operation = %operation.name))]
fn compile_operation(
    operation: &Operation,
    document: &Document,
    dialect: &dyn Dialect,
    config: &Config,
) -> Result<Vec<String>, DqlError> {
    if operation.kind == OperationKind::Mutation && operation.tables.is_empty() {
        return Err(ShapeError::MutationRequiresTable {
            operation: operation.name.clone(),
        }
        .into());
    }

    let env = Environment::build(&config.variables, &operation.variables)?;
    let mut stack: CallStack = vec![operation.name.clone()];

    let mut outputs = Vec::with_capacity(operation.tables.len());
    for table in &operation.tables {
        outputs.push(compile_table(
            operation, table, &env, document, dialect, config, &mut stack,
        )?);
    }
    Ok(outputs)
}

fn compile_table(
    operation: &Operation,
    table: &Table,
    env: &Environment,
    document: &Document,
    dialect: &dyn Dialect,
    config: &Config,
    stack: &mut CallStack,
) -> Result<String, DqlError> {
    if table.delete {
        return delete::lower(table, env, config, document, dialect, stack);
    }

    match operation.kind {
        OperationKind::Query => {
            validate_no_assignments(table)?;
            let mut builder = query::build_select(table, env, document, dialect, stack)?;
            if let Some(order_by) = &config.order_by {
                builder = builder.order(order_by, config.descending);
            }
            if let Some(limit) = config.limit {
                builder = builder.limit(limit);
            }
            if let Some(offset) = config.offset {
                builder = builder.offset(offset);
            }
            if let Some(returning) = &config.returning {
                builder = builder.returning(returning);
            }
            Ok(builder.to_string())
        }
        OperationKind::Mutation => {
            if table.joins().next().is_some() {
                return Err(ShapeError::JoinsNotAllowedInMutation {
                    table: table.name.clone(),
                }
                .into());
            }
            if table.params.is_empty() {
                mutation::lower_insert(table, env, config, document, dialect, stack)
            } else {
                mutation::lower_update(table, env, config, document, dialect, stack)
            }
        }
    }
}

/// A query table (and, recursively, its joins) may not carry field
/// assignments; those are a mutation-only concept.
fn validate_no_assignments(table: &Table) -> Result<(), ShapeError> {
    for field in table.fields() {
        if field.value.is_some() {
            return Err(ShapeError::AssignmentsNotAllowedInQuery {
                table: table.name.clone(),
            });
        }
    }
    for join in table.joins() {
        validate_no_assignments(join)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn mutation_without_table_fails() {
        let source = "mutation m { }";
        let err = compile(source, Flavor::Postgres, &Config::default()).unwrap_err();
        assert!(matches!(
            err,
            DqlError::Shape(ShapeError::MutationRequiresTable { .. })
        ));
    }

    #[test]
    fn query_output_begins_with_select() {
        let source = "query q { users { } }";
        let out = compile(source, Flavor::Postgres, &Config::default()).unwrap();
        assert_eq!(out, vec!["SELECT * FROM users".to_string()]);
    }

    #[test]
    fn insert_scenario_matches_spec() {
        let source = r#"mutation m { users { name: "John" age: 45 } }"#;
        let out = compile(source, Flavor::Postgres, &Config::default()).unwrap();
        assert_eq!(out, vec!["INSERT INTO users (name, age) VALUES ('John', 45)"]);
    }

    #[test]
    fn update_scenario_matches_spec() {
        let source = "mutation m($id,$name,$age) { users(id=$id) { name:$name age:$age } }";
        let mut variables = HashMap::new();
        variables.insert("id".to_string(), crate::ast::Scalar::Integer(9));
        variables.insert(
            "name".to_string(),
            crate::ast::Scalar::String("John".to_string()),
        );
        variables.insert("age".to_string(), crate::ast::Scalar::Integer(45));
        let config = Config {
            variables,
            ..Config::default()
        };
        let out = compile(source, Flavor::Postgres, &config).unwrap();
        assert_eq!(
            out,
            vec!["UPDATE users SET name = 'John', age = 45 WHERE (id = 9)"]
        );
    }

    #[test]
    fn delete_scenario_matches_spec() {
        let source = "mutation m($name) { - users(name=$name) }";
        let mut variables = HashMap::new();
        variables.insert("name".to_string(), crate::ast::Scalar::String("Tyler".to_string()));
        let config = Config {
            variables,
            limit: Some(1),
            order_by: Some("name".to_string()),
            descending: true,
            ..Config::default()
        };
        let out = compile(source, Flavor::Postgres, &config).unwrap();
        assert_eq!(
            out,
            vec!["DELETE FROM users WHERE (name = 'Tyler') ORDER BY name DESC LIMIT 1"]
        );
    }

    #[test]
    fn query_call_subselect_scenario_matches_spec() {
        let source = r#"
            query getUserID { users(id=3) { id } }
            query getBookmarksForUser { users(id=getUserID()) { name } }
        "#;
        let out = compile(source, Flavor::Postgres, &Config::default()).unwrap();
        assert_eq!(
            out,
            vec![
                "SELECT users.id FROM users WHERE (id = 3)".to_string(),
                "SELECT users.name FROM users WHERE (id = (SELECT users.id FROM users WHERE (id = 3)))".to_string(),
            ]
        );
    }

    #[test]
    fn in_selector_with_mixed_scalars_and_variable() {
        let source = r#"query q($dog) { messages(content in ["cat", true, $dog]) { } }"#;
        let mut variables = HashMap::new();
        variables.insert("dog".to_string(), crate::ast::Scalar::String("dog".to_string()));
        let config = Config {
            variables,
            ..Config::default()
        };
        let out = compile(source, Flavor::Postgres, &config).unwrap();
        assert_eq!(
            out,
            vec!["SELECT * FROM messages WHERE (content in ('cat', TRUE, 'dog'))"]
        );
    }

    #[test]
    fn missing_required_variable_is_fatal() {
        let source = "mutation m($id!) { users(id=$id) { name: $id } }";
        let err = compile(source, Flavor::Postgres, &Config::default()).unwrap_err();
        assert!(matches!(
            err,
            DqlError::Resolution(crate::error::ResolutionError::MissingRequiredVariable { .. })
        ));
    }

    #[test]
    fn optional_variable_absent_omits_field() {
        let source = "mutation m($tag) { users { name: \"John\" nickname: $tag } }";
        let out = compile(source, Flavor::Postgres, &Config::default()).unwrap();
        assert_eq!(out, vec!["INSERT INTO users (name) VALUES ('John')"]);
    }
}
