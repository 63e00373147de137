//! SQL dialect support.
//!
//! The dialect adapter is an external collaborator, out of scope as a real
//! network-facing driver, but still needed here as an opaque,
//! flavor-parameterized interface since nothing else in the workspace
//! supplies one. Mirrors `oxide_sql_core::dialect::Dialect`.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use crate::config::Flavor;

/// Flavor-specific behavior the compiler defers to: scalar quoting and
/// feature gating. No identifier quoting: the document language's own
/// scenarios emit table/column references unquoted (e.g. `users.name`),
/// so this trait stays narrow to what's actually exercised.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Whether this dialect supports a `RETURNING` clause on
    /// INSERT/UPDATE/DELETE (and, on the outermost statement, SELECT too).
    fn supports_returning(&self) -> bool {
        true
    }

    /// Renders a boolean literal.
    fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    /// Quotes a string scalar: single-quoted, single-quotes escaped by
    /// doubling.
    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }
}

/// Resolves the concrete dialect for a [`Flavor`].
#[must_use]
pub fn for_flavor(flavor: Flavor) -> Box<dyn Dialect> {
    match flavor {
        Flavor::Postgres => Box::new(Postgres),
        Flavor::MySql => Box::new(MySql),
        Flavor::Sqlite => Box::new(Sqlite),
    }
}
