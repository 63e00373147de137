//! Recursive-descent parser producing a [`crate::ast::Document`] from
//! document-language source text.
//!
//! Grammar, informally:
//!
//! ```text
//! document   := operation*
//! operation  := ('query' | 'mutation') name ('(' vardecl_list? ')')? '{' table* '}'
//! vardecl    := '$' name '!'?
//! table      := '-'? name ('(' selector_list? ')')? ('{' child* '}')?
//! child      := field | join
//! join       := '...' 'on' table
//! field      := name ('[' alias ']')? | name ':' expression
//! selector   := path selector_op expression
//! ```
//!
//! Single-shot: the first [`ParseError`] abandons the whole document, there
//! is no error recovery.

mod error;
mod parser;

pub use error::ParseError;
pub use parser::Parser;
