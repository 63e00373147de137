//! # oxide-dql
//!
//! Compiler for a GraphQL-inspired, declarative document language that
//! lowers to dialect-specific SQL strings. A document holds one or more
//! named `query`/`mutation` operations describing table selections, joins,
//! filter predicates, and field assignments; this crate parses it into a
//! typed AST, resolves variables, and lowers each top-level operation into
//! a `SELECT`, `INSERT`, `UPDATE`, or `DELETE` statement.
//!
//! ```
//! use oxide_dql::{compile, Config, Flavor};
//!
//! let sql = compile(
//!     r#"mutation m { users { name: "John" age: 45 } }"#,
//!     Flavor::Postgres,
//!     &Config::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(sql, vec!["INSERT INTO users (name, age) VALUES ('John', 45)"]);
//! ```
//!
//! Out of scope, by design: executing the produced SQL, a CLI wrapper,
//! file I/O, a YAML test harness, and a real per-flavor database driver.
//! `dialect::Dialect` stays a small in-crate adapter rather than a
//! network-facing client.

#![forbid(unsafe_code)]

pub mod ast;
pub mod compiler;
pub mod config;
pub mod dialect;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolver;

mod builder;

pub use compiler::compile;
pub use config::{Config, Flavor};
pub use error::{DqlError, ResolutionError, ShapeError, ValueError};
pub use parser::ParseError;
