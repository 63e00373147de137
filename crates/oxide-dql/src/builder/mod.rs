//! QueryBuilder adapter.
//!
//! A thin, flavor-parameterized string assembler. It carries no state
//! beyond the statement under construction and makes no structural
//! decisions. Which clauses appear, how a join is hoisted, and what a
//! selector compiles to are all decided by `crate::compiler` before
//! reaching the builder. This mirrors `oxide_sql_core::builder`'s split
//! between the builder (assembly) and the parser/compiler (decisions).

use std::fmt;

use crate::dialect::Dialect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Select,
    Insert,
    Update,
    Delete,
}

/// Accumulates clause fragments for a single SQL statement, then renders
/// them via [`fmt::Display`].
pub struct QueryBuilder<'d> {
    dialect: &'d dyn Dialect,
    kind: Kind,
    target: String,
    fields: Vec<String>,
    values: Vec<String>,
    joins: Vec<String>,
    sets: Vec<String>,
    where_clause: Option<String>,
    order: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    returning: Option<String>,
}

impl<'d> QueryBuilder<'d> {
    fn new(dialect: &'d dyn Dialect, kind: Kind) -> Self {
        Self {
            dialect,
            kind,
            target: String::new(),
            fields: Vec::new(),
            values: Vec::new(),
            joins: Vec::new(),
            sets: Vec::new(),
            where_clause: None,
            order: None,
            limit: None,
            offset: None,
            returning: None,
        }
    }

    #[must_use]
    pub fn select(dialect: &'d dyn Dialect) -> Self {
        Self::new(dialect, Kind::Select)
    }

    #[must_use]
    pub fn insert(dialect: &'d dyn Dialect) -> Self {
        Self::new(dialect, Kind::Insert)
    }

    #[must_use]
    pub fn update(dialect: &'d dyn Dialect) -> Self {
        Self::new(dialect, Kind::Update)
    }

    #[must_use]
    pub fn delete(dialect: &'d dyn Dialect) -> Self {
        Self::new(dialect, Kind::Delete)
    }

    #[must_use]
    pub fn from(mut self, name: impl Into<String>) -> Self {
        self.target = name.into();
        self
    }

    #[must_use]
    pub fn into_table(self, name: impl Into<String>) -> Self {
        self.from(name)
    }

    #[must_use]
    pub fn table(self, name: impl Into<String>) -> Self {
        self.from(name)
    }

    /// Adds a projection column (SELECT) or an insert column name.
    #[must_use]
    pub fn field(mut self, expr: impl Into<String>) -> Self {
        self.fields.push(expr.into());
        self
    }

    /// Adds a `VALUES(...)` entry for an INSERT, in the same order as the
    /// matching `field` call.
    #[must_use]
    pub fn value(mut self, expr: impl Into<String>) -> Self {
        self.values.push(expr.into());
        self
    }

    #[must_use]
    pub fn join(mut self, clause: impl Into<String>) -> Self {
        self.joins.push(clause.into());
        self
    }

    #[must_use]
    pub fn set(mut self, column: &str, expr: impl Into<String>) -> Self {
        self.sets.push(format!("{column} = {}", expr.into()));
        self
    }

    #[must_use]
    pub fn where_clause(mut self, predicate: impl Into<String>) -> Self {
        self.where_clause = Some(predicate.into());
        self
    }

    #[must_use]
    pub fn order(mut self, column: &str, descending: bool) -> Self {
        self.order = Some(format!(
            "{column} {}",
            if descending { "DESC" } else { "ASC" }
        ));
        self
    }

    #[must_use]
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    #[must_use]
    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Sets `RETURNING col`, silently dropped (with a `tracing::warn!`) when
    /// the dialect doesn't support it.
    #[must_use]
    pub fn returning(mut self, column: &str) -> Self {
        if self.dialect.supports_returning() {
            self.returning = Some(column.to_string());
        } else {
            tracing::warn!(
                dialect = self.dialect.name(),
                column,
                "RETURNING requested but not supported by this dialect; ignoring"
            );
        }
        self
    }

    /// Quotes a string scalar per the dialect's rules.
    #[must_use]
    pub fn str(&self, s: &str) -> String {
        self.dialect.quote_string(s)
    }

    /// Emits `s` verbatim.
    #[must_use]
    pub fn raw(&self, s: &str) -> String {
        s.to_string()
    }
}

impl fmt::Display for QueryBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Kind::Select => {
                let projection = if self.fields.is_empty() {
                    "*".to_string()
                } else {
                    self.fields.join(", ")
                };
                write!(f, "SELECT {projection} FROM {}", self.target)?;
                for join in &self.joins {
                    write!(f, " INNER JOIN {join}")?;
                }
                self.write_tail(f, true)
            }
            Kind::Insert => {
                write!(
                    f,
                    "INSERT INTO {} ({}) VALUES ({})",
                    self.target,
                    self.fields.join(", "),
                    self.values.join(", ")
                )?;
                if let Some(r) = &self.returning {
                    write!(f, " RETURNING {r}")?;
                }
                Ok(())
            }
            Kind::Update => {
                write!(f, "UPDATE {} SET {}", self.target, self.sets.join(", "))?;
                self.write_tail(f, false)
            }
            Kind::Delete => {
                write!(f, "DELETE FROM {}", self.target)?;
                for join in &self.joins {
                    write!(f, " INNER JOIN {join}")?;
                }
                self.write_tail(f, false)
            }
        }
    }
}

impl QueryBuilder<'_> {
    /// WHERE / ORDER BY / LIMIT [/ OFFSET] / RETURNING, shared by every
    /// clause shape except INSERT. `with_offset` is only set for SELECT;
    /// UPDATE and DELETE don't carry an OFFSET.
    fn write_tail(&self, f: &mut fmt::Formatter<'_>, with_offset: bool) -> fmt::Result {
        if let Some(w) = &self.where_clause {
            write!(f, " WHERE {w}")?;
        }
        if let Some(o) = &self.order {
            write!(f, " ORDER BY {o}")?;
        }
        if let Some(n) = self.limit {
            write!(f, " LIMIT {n}")?;
        }
        if with_offset {
            if let Some(n) = self.offset {
                write!(f, " OFFSET {n}")?;
            }
        }
        if let Some(r) = &self.returning {
            write!(f, " RETURNING {r}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Postgres;

    #[test]
    fn renders_select_with_join_and_tail() {
        let sql = QueryBuilder::select(&Postgres)
            .field("users.name")
            .from("users")
            .join("(SELECT 1) AS x ON (x.id = users.id)")
            .where_clause("(id = 1)")
            .order("name", true)
            .limit(1)
            .offset(2)
            .to_string();
        assert_eq!(
            sql,
            "SELECT users.name FROM users INNER JOIN (SELECT 1) AS x ON (x.id = users.id) WHERE (id = 1) ORDER BY name DESC LIMIT 1 OFFSET 2"
        );
    }

    #[test]
    fn renders_empty_select_as_star() {
        let sql = QueryBuilder::select(&Postgres).from("users").to_string();
        assert_eq!(sql, "SELECT * FROM users");
    }

    #[test]
    fn renders_insert() {
        let sql = QueryBuilder::insert(&Postgres)
            .into_table("users")
            .field("name")
            .value("'John'")
            .field("age")
            .value("45")
            .to_string();
        assert_eq!(sql, "INSERT INTO users (name, age) VALUES ('John', 45)");
    }

    #[test]
    fn returning_dropped_on_unsupported_dialect() {
        use crate::dialect::MySql;
        let sql = QueryBuilder::insert(&MySql)
            .into_table("users")
            .field("name")
            .value("'John'")
            .returning("id")
            .to_string();
        assert_eq!(sql, "INSERT INTO users (name) VALUES ('John')");
    }
}
