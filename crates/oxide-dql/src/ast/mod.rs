mod document;
mod expression;

pub use document::{ChildNode, Document, Field, Operation, OperationKind, Selector, Table, VariableDecl};
pub use expression::{BinaryOp, Expression, Scalar, SelectorOp};
