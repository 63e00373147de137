//! Query lowering: a query table becomes
//! `SELECT <projection> FROM <name> [joins] [WHERE ...] [ORDER BY ...] [LIMIT ...] [OFFSET ...]`.
//!
//! `...on` spreads lower to nested derived-table joins with predicate
//! hoisting: a child join's selectors split into those whose RHS references
//! the parent table's qualified column (into `ON`) and everything else
//! (into the join's own inner `WHERE`), resolved by AST reference
//! (`Expression::referenced_table`) rather than by scanning compiled SQL
//! text.

use crate::ast::{Document, Selector, Table};
use crate::builder::QueryBuilder;
use crate::dialect::Dialect;
use crate::error::DqlError;

use super::expr::{compile_on_clause, compile_selector_list, CallStack};

/// Builds `table` as a standalone `SELECT`, without any outer `Config`
/// applied. Shared by the true top-level query path (which the caller
/// tacks `LIMIT`/`OFFSET`/`ORDER BY`/`RETURNING` onto) and query-call
/// subselects (which never receive outer config).
///
/// # Errors
///
/// Returns a [`DqlError`] if a join or selector expression fails to
/// compile, including an unresolvable cross-operation query call.
pub fn build_select<'d>(
    table: &Table,
    env: &crate::resolver::Environment,
    doc: &Document,
    dialect: &'d dyn Dialect,
    stack: &mut CallStack,
) -> Result<QueryBuilder<'d>, DqlError> {
    let mut builder = QueryBuilder::select(dialect).from(table.name.clone());
    for column in projection_for(table, true) {
        builder = builder.field(column);
    }
    for join in table.joins() {
        builder = builder.join(lower_join(&table.name, join, env, doc, dialect, stack)?);
    }
    if !table.params.is_empty() {
        let selectors: Vec<&Selector> = table.params.iter().collect();
        builder =
            builder.where_clause(compile_selector_list(&selectors, env, doc, dialect, stack)?);
    }
    Ok(builder)
}

/// Renders `table` as a complete SQL string with no outer config: the
/// entry point used to inline a query call as a nested `SELECT`.
///
/// # Errors
///
/// Returns a [`DqlError`] under the same conditions as [`build_select`].
pub fn lower_table(
    table: &Table,
    env: &crate::resolver::Environment,
    doc: &Document,
    dialect: &dyn Dialect,
    stack: &mut CallStack,
) -> Result<String, DqlError> {
    Ok(build_select(table, env, doc, dialect, stack)?.to_string())
}

/// Lowers a `...on <join>` spread into `(SELECT ...) AS <join.name> ON (...)`.
/// `pub(crate)`: delete lowering reuses this directly.
pub(crate) fn lower_join(
    parent_name: &str,
    join: &Table,
    env: &crate::resolver::Environment,
    doc: &Document,
    dialect: &dyn Dialect,
    stack: &mut CallStack,
) -> Result<String, DqlError> {
    let (on_selectors, hoisted): (Vec<&Selector>, Vec<&Selector>) = join
        .params
        .iter()
        .partition(|s| s.rhs.referenced_table() == Some(parent_name));

    let mut projection = projection_for(join, false);
    for selector in &on_selectors {
        projection.push(format!("{}.{}", join.name, selector.lhs));
    }

    let mut builder = QueryBuilder::select(dialect).from(join.name.clone());
    for column in projection {
        builder = builder.field(column);
    }
    for nested in join.joins() {
        builder = builder.join(lower_join(&join.name, nested, env, doc, dialect, stack)?);
    }
    if !hoisted.is_empty() {
        builder = builder.where_clause(compile_selector_list(&hoisted, env, doc, dialect, stack)?);
    }

    let inner_sql = builder.to_string();
    let on_sql = compile_on_clause(&join.name, &on_selectors, env, doc, dialect, stack)?;
    Ok(format!("({inner_sql}) AS {} ON {on_sql}", join.name))
}

/// The projection a table contributes to a `SELECT` list.
///
/// `is_top` distinguishes the two places this is called from: the
/// outermost table in a query (or a query-call's table), where a field's
/// own alias applies directly since there's no enclosing derived table to
/// defer to; versus a join's own derived-table select, where a field's
/// alias is applied one level up, at the point the join's parent crosses
/// into it (see [`join_contribution`]).
fn projection_for(table: &Table, is_top: bool) -> Vec<String> {
    let mut items: Vec<String> = table
        .fields()
        .map(|field| {
            let base = format!("{}.{}", table.name, field.name);
            if is_top {
                match &field.alias {
                    Some(alias) => format!("{base} AS {alias}"),
                    None => base,
                }
            } else {
                base
            }
        })
        .collect();
    for join in table.joins() {
        items.extend(join_contribution(join));
    }
    items
}

/// What a join contributes to its *parent's* projection: its own fields,
/// qualified and aliased (the boundary crossing happens exactly here), plus
/// anything its own descendants already aliased further down, forwarded
/// unqualified by their already-final name.
fn join_contribution(join: &Table) -> Vec<String> {
    let mut items: Vec<String> = join
        .fields()
        .map(|field| {
            let base = format!("{}.{}", join.name, field.name);
            match &field.alias {
                Some(alias) => format!("{base} AS {alias}"),
                None => base,
            }
        })
        .collect();
    for nested in join.joins() {
        items.extend(bare_names(nested));
    }
    items
}

/// Final exposed names of `table`'s fields (and, recursively, its own
/// joins' fields) once they've already crossed one derived-table boundary
/// and only need to be forwarded by name.
fn bare_names(table: &Table) -> Vec<String> {
    let mut items: Vec<String> = table
        .fields()
        .map(|field| field.alias.clone().unwrap_or_else(|| field.name.clone()))
        .collect();
    for nested in table.joins() {
        items.extend(bare_names(nested));
    }
    items
}
