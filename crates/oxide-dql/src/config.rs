//! Caller-facing configuration surface.
//!
//! `Config` derives `serde::Deserialize` the way the workspace's migration
//! and ORM crates derive `serde` for their own config/snapshot types, so a
//! host application can load it from JSON/YAML/etc. without this crate
//! performing file I/O itself.

use std::collections::HashMap;

use crate::ast::Scalar;

/// The target SQL dialect.
///
/// A closed enum rather than a free-form string, since exactly three
/// flavors exist and are known at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    Postgres,
    #[serde(rename = "mysql")]
    MySql,
    #[serde(rename = "sqlite3")]
    Sqlite,
}

/// All fields optional; every option applies to the outermost statement
/// only.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub variables: HashMap<String, Scalar>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
    pub descending: bool,
    pub returning: Option<String>,
}
