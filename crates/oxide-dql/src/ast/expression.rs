/// A scalar value as defined by the document grammar.
///
/// `Deserialize` is derived so a [`crate::config::Config`] can bind
/// caller-supplied variables straight from JSON (or any other `serde`
/// format) without a separate wire type.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

/// A predicate operator appearing in a table's selector list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    In,
}

impl SelectorOp {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::In => "in",
        }
    }
}

/// A value-level AST node. Produced by the parser, consumed unchanged by
/// the selector/expression compiler.
///
/// `Call` covers both `FunctionCall` and `QueryCall` from the document
/// grammar: the parser cannot tell which one it is looking at (both read as
/// `name(args)`), so disambiguation happens later, against the enclosing
/// `Document`'s operation table (see [`crate::compiler`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Scalar),
    Variable(String),
    /// Verbatim SQL fragment: an unquoted all-uppercase identifier, or such
    /// an identifier directly followed by a string (`INTERVAL '1 week'`).
    RawText(String),
    /// A bare (optionally table-qualified) column reference, e.g. `users.id`.
    Column {
        table: Option<String>,
        name: String,
    },
    Call {
        name: String,
        args: Vec<Expression>,
    },
    List(Vec<Expression>),
    BinaryOp {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
}

impl Expression {
    #[must_use]
    pub fn column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Column {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    /// The table name this expression references as a qualified column, if
    /// any. Used by join lowering to decide ON-clause membership by AST
    /// reference rather than by scanning compiled SQL text.
    #[must_use]
    pub fn referenced_table(&self) -> Option<&str> {
        match self {
            Self::Column {
                table: Some(t), ..
            } => Some(t.as_str()),
            _ => None,
        }
    }
}
