use thiserror::Error;

use crate::parser::ParseError;

/// A document-language compile failure.
///
/// Parse and shape errors are fatal for the containing operation. Value
/// errors are recoverable at field granularity; see [`ValueError`] and
/// `crate::compiler`'s mutation field handling.
#[derive(Debug, Error)]
pub enum DqlError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// The AST violates one of the structural invariants in the data model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("field '{field}' of table '{table}' may not have an alias in a mutation")]
    AliasInMutation { table: String, field: String },
    #[error("field '{field}' of table '{table}' requires a value in a mutation")]
    ValueRequired { table: String, field: String },
    #[error("delete table '{table}' may not contain non-join field children")]
    FieldsNotAllowedInDelete { table: String },
    #[error("table '{table}' contains a join but is not a delete")]
    JoinsNotAllowedInMutation { table: String },
    #[error("table '{table}' in a query may not contain field assignments")]
    AssignmentsNotAllowedInQuery { table: String },
    #[error("delete table '{table}' requires at least one selector")]
    DeleteRequiresSelector { table: String },
    #[error("mutation '{operation}' declares no table")]
    MutationRequiresTable { operation: String },
    #[error("table '{table}' has no field with a resolvable value")]
    AtLeastOneFieldRequired { table: String },
}

/// Variable or cross-operation reference resolution failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("missing required variable '${name}'")]
    MissingRequiredVariable { name: String },
    #[error("query call references unknown operation '{name}'")]
    UnknownOperation { name: String },
    #[error("operation '{name}' recursively calls itself through a query call")]
    RecursiveQueryCall { name: String },
}

/// A scalar value could not be serialized. Rare; the field it belongs to is
/// dropped rather than aborting the whole statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("value for field '{field}' of table '{table}' could not be serialized")]
    SerializationFailed { table: String, field: String },
}
