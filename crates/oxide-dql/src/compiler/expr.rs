//! Selector and expression compiler.
//!
//! Shared by query and mutation/delete lowering to emit `WHERE` predicates,
//! `ON` predicates, and scalar/variable/function/list/query-call
//! expressions. A `Call` node is disambiguated against the enclosing
//! [`Document`]'s operation table here, not earlier. See the AST note on
//! [`crate::ast::Expression::Call`].

use std::collections::HashMap;

use crate::ast::{Document, Expression, Scalar, Selector};
use crate::dialect::Dialect;
use crate::error::{DqlError, ResolutionError};
use crate::resolver::Environment;

/// Operation names currently being lowered, used to reject a `QueryCall`
/// that would recurse back into an operation already on the stack.
pub type CallStack = Vec<String>;

/// Compiles a single expression node to its SQL text.
///
/// # Errors
///
/// Returns a [`DqlError`] if the expression is a query call to an
/// operation already being lowered (recursion), or if resolving a
/// cross-operation query call itself fails.
pub fn compile_expression(
    expr: &Expression,
    env: &Environment,
    doc: &Document,
    dialect: &dyn Dialect,
    stack: &mut CallStack,
) -> Result<String, DqlError> {
    match expr {
        Expression::Literal(scalar) => Ok(compile_scalar(scalar, dialect)),
        Expression::Variable(name) => Ok(match env.get(name) {
            Some(scalar) => compile_scalar(scalar, dialect),
            None => "NULL".to_string(),
        }),
        Expression::RawText(text) => Ok(text.clone()),
        Expression::Column { table, name } => Ok(match table {
            Some(t) => format!("{t}.{name}"),
            None => name.clone(),
        }),
        Expression::List(items) => {
            let mut rendered = Vec::with_capacity(items.len());
            for item in items {
                rendered.push(compile_expression(item, env, doc, dialect, stack)?);
            }
            Ok(format!("({})", rendered.join(", ")))
        }
        Expression::BinaryOp { op, lhs, rhs } => {
            let lhs = compile_expression(lhs, env, doc, dialect, stack)?;
            let rhs = compile_expression(rhs, env, doc, dialect, stack)?;
            Ok(format!("{lhs} {} {rhs}", op.as_sql()))
        }
        Expression::Call { name, args } => {
            if let Some(callee) = doc.operation(name) {
                compile_query_call(callee, args, env, doc, dialect, stack)
            } else {
                let mut rendered = Vec::with_capacity(args.len());
                for arg in args {
                    rendered.push(compile_expression(arg, env, doc, dialect, stack)?);
                }
                Ok(format!("{name}({})", rendered.join(", ")))
            }
        }
    }
}

/// Renders a resolved scalar using each kind's quoting rule.
#[must_use]
pub fn compile_scalar(scalar: &Scalar, dialect: &dyn Dialect) -> String {
    match scalar {
        Scalar::Null => "NULL".to_string(),
        Scalar::Bool(b) => dialect.bool_literal(*b).to_string(),
        Scalar::Integer(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::String(s) => dialect.quote_string(s),
    }
}

/// `lhs op rhs` selectors joined by ` AND `, wrapped in exactly one pair of
/// outer parentheses. Used for every `WHERE` clause (query/update/delete).
///
/// # Errors
///
/// Returns a [`DqlError`] if any selector's right-hand side fails to
/// compile.
pub fn compile_selector_list(
    selectors: &[&Selector],
    env: &Environment,
    doc: &Document,
    dialect: &dyn Dialect,
    stack: &mut CallStack,
) -> Result<String, DqlError> {
    let mut parts = Vec::with_capacity(selectors.len());
    for selector in selectors {
        let rhs = compile_expression(&selector.rhs, env, doc, dialect, stack)?;
        parts.push(format!("{} {} {rhs}", selector.lhs, selector.op.as_sql()));
    }
    Ok(format!("({})", parts.join(" AND ")))
}

/// Same shape as [`compile_selector_list`], but qualifies each selector's
/// `lhs` with the join's own table name, the form a join's `ON` clause
/// needs (e.g. `bookmarks.user_id = users.id`).
///
/// # Errors
///
/// Returns a [`DqlError`] under the same conditions as
/// [`compile_selector_list`].
pub fn compile_on_clause(
    join_table: &str,
    selectors: &[&Selector],
    env: &Environment,
    doc: &Document,
    dialect: &dyn Dialect,
    stack: &mut CallStack,
) -> Result<String, DqlError> {
    let mut parts = Vec::with_capacity(selectors.len());
    for selector in selectors {
        let rhs = compile_expression(&selector.rhs, env, doc, dialect, stack)?;
        parts.push(format!(
            "{join_table}.{} {} {rhs}",
            selector.lhs,
            selector.op.as_sql()
        ));
    }
    Ok(format!("({})", parts.join(" AND ")))
}

/// Evaluates an expression down to a caller-supplied scalar, for binding a
/// `QueryCall`'s positional arguments into the callee's variable scope.
/// Only `Literal` and `Variable` make sense here; anything else yields
/// `None` and the corresponding callee variable is left unbound.
fn evaluate_to_scalar(expr: &Expression, env: &Environment) -> Option<Scalar> {
    match expr {
        Expression::Literal(scalar) => Some(scalar.clone()),
        Expression::Variable(name) => env.get(name).cloned(),
        _ => None,
    }
}

fn compile_query_call(
    callee: &crate::ast::Operation,
    args: &[Expression],
    env: &Environment,
    doc: &Document,
    dialect: &dyn Dialect,
    stack: &mut CallStack,
) -> Result<String, DqlError> {
    if stack.iter().any(|name| name == &callee.name) {
        return Err(ResolutionError::RecursiveQueryCall {
            name: callee.name.clone(),
        }
        .into());
    }

    let mut bound = HashMap::new();
    for (decl, arg) in callee.variables.iter().zip(args) {
        if let Some(scalar) = evaluate_to_scalar(arg, env) {
            bound.insert(decl.name.clone(), scalar);
        }
    }
    let nested_env = Environment::build(&bound, &callee.variables)?;

    let table = callee.tables.first().ok_or_else(|| {
        crate::error::ShapeError::MutationRequiresTable {
            operation: callee.name.clone(),
        }
    })?;

    stack.push(callee.name.clone());
    let sql = crate::compiler::query::lower_table(table, &nested_env, doc, dialect, stack)?;
    stack.pop();

    tracing::debug!(operation = %callee.name, "inlined query-call as nested SELECT");
    Ok(format!("({sql})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Document, Operation, OperationKind, Table};
    use crate::dialect::Postgres;

    fn env() -> Environment {
        Environment::build(&HashMap::new(), &[]).unwrap()
    }

    #[test]
    fn compiles_literal_scalars() {
        let doc = Document::default();
        let mut stack = Vec::new();
        assert_eq!(
            compile_expression(
                &Expression::Literal(Scalar::String("it's".into())),
                &env(),
                &doc,
                &Postgres,
                &mut stack
            )
            .unwrap(),
            "'it''s'"
        );
        assert_eq!(
            compile_expression(
                &Expression::Literal(Scalar::Bool(true)),
                &env(),
                &doc,
                &Postgres,
                &mut stack
            )
            .unwrap(),
            "TRUE"
        );
    }

    #[test]
    fn unresolved_variable_compiles_to_null() {
        let doc = Document::default();
        let mut stack = Vec::new();
        let out = compile_expression(
            &Expression::Variable("missing".into()),
            &env(),
            &doc,
            &Postgres,
            &mut stack,
        )
        .unwrap();
        assert_eq!(out, "NULL");
    }

    #[test]
    fn selector_list_wraps_in_one_paren_pair() {
        use crate::ast::SelectorOp;
        let doc = Document::default();
        let mut stack = Vec::new();
        let selectors = vec![
            Selector {
                lhs: "name".into(),
                op: SelectorOp::Eq,
                rhs: Expression::Literal(Scalar::String("Example".into())),
            },
            Selector {
                lhs: "age".into(),
                op: SelectorOp::Eq,
                rhs: Expression::Literal(Scalar::Integer(12)),
            },
        ];
        let refs: Vec<&Selector> = selectors.iter().collect();
        let out = compile_selector_list(&refs, &env(), &doc, &Postgres, &mut stack).unwrap();
        assert_eq!(out, "(name = 'Example' AND age = 12)");
    }

    #[test]
    fn recursive_query_call_is_rejected() {
        let doc = Document {
            operations: vec![Operation {
                kind: OperationKind::Query,
                name: "q".to_string(),
                variables: vec![],
                tables: vec![Table {
                    name: "users".to_string(),
                    params: vec![crate::ast::Selector {
                        lhs: "id".to_string(),
                        op: crate::ast::SelectorOp::Eq,
                        rhs: Expression::Call {
                            name: "q".to_string(),
                            args: vec![],
                        },
                    }],
                    children: vec![],
                    delete: false,
                }],
            }],
        };
        let mut stack = vec!["q".to_string()];
        let err = compile_query_call(
            &doc.operations[0],
            &[],
            &env(),
            &doc,
            &Postgres,
            &mut stack,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DqlError::Resolution(ResolutionError::RecursiveQueryCall { .. })
        ));
    }
}
