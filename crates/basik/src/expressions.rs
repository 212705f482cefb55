//! Syntax tree consumed by the compiler.
//!
//! This is a closed node set produced by the front end in [`crate::parse`].
//! Constructs the compiler cannot lower are still represented (as
//! `Unsupported` nodes, or as operators and literals the compiler rejects) so
//! that the compiler, not the front end, decides what fails and where.

use crate::parse::CodeRange;

/// A name with the source range it was written at.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Identifier {
    pub name: String,
    pub position: CodeRange,
}

impl Identifier {
    pub fn new(name: impl Into<String>, position: CodeRange) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// Literal constant as written in source.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    /// Integer literal outside the `i64` range, kept as its source text.
    LongInt(String),
    Float(f64),
    Complex { real: f64, imag: f64 },
    Str(String),
    Bytes(Vec<u8>),
    Ellipsis,
}

impl Literal {
    /// Python type name, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::LongInt(_) => "int",
            Self::Float(_) => "float",
            Self::Complex { .. } => "complex",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::Ellipsis => "ellipsis",
        }
    }
}

/// Binary operators.
///
/// Uses strum `Display` derive with per-variant serialization for operator symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, serde::Serialize, serde::Deserialize)]
pub enum Operator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mult,
    #[strum(serialize = "@")]
    MatMult,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "**")]
    Pow,
    #[strum(serialize = "<<")]
    LShift,
    #[strum(serialize = ">>")]
    RShift,
    #[strum(serialize = "|")]
    BitOr,
    #[strum(serialize = "^")]
    BitXor,
    #[strum(serialize = "&")]
    BitAnd,
    #[strum(serialize = "//")]
    FloorDiv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, serde::Serialize, serde::Deserialize)]
pub enum UnaryOperator {
    #[strum(serialize = "-")]
    Neg,
    #[strum(serialize = "+")]
    Pos,
    #[strum(serialize = "not")]
    Not,
    #[strum(serialize = "~")]
    Invert,
}

/// Defined separately since these operators always return a bool
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, serde::Serialize, serde::Deserialize)]
pub enum CmpOperator {
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    NotEq,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    LtE,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    GtE,
    #[strum(serialize = "is")]
    Is,
    #[strum(serialize = "is not")]
    IsNot,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "not in")]
    NotIn,
}

/// An expression together with its source range.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprLoc {
    pub position: CodeRange,
    pub expr: Expr,
}

impl ExprLoc {
    pub fn new(position: CodeRange, expr: Expr) -> Self {
        Self { position, expr }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Name(Identifier),
    /// Positional call: `callable(args...)`.
    Call {
        callable: Box<ExprLoc>,
        args: Vec<ExprLoc>,
    },
    List(Vec<ExprLoc>),
    Op {
        left: Box<ExprLoc>,
        op: Operator,
        right: Box<ExprLoc>,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<ExprLoc>,
    },
    /// Comparison as parsed; chains keep every operator so they can be rejected.
    Compare {
        left: Box<ExprLoc>,
        ops: Vec<CmpOperator>,
        comparators: Vec<ExprLoc>,
    },
    /// Any expression kind without a lowering, named after the source construct.
    Unsupported(&'static str),
}

/// A function definition with plain positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Identifier,
    pub params: Vec<Identifier>,
    pub body: Vec<Node>,
    pub position: CodeRange,
    /// First signature feature the calling convention cannot express, with
    /// its range. When set, `params` and `body` are left empty.
    pub unsupported: Option<(&'static str, CodeRange)>,
}

/// Statement node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Pass,
    Expr(ExprLoc),
    Return {
        value: Option<ExprLoc>,
        position: CodeRange,
    },
    /// Assignment with every target kept; anything but one plain name is rejected later.
    Assign {
        targets: Vec<ExprLoc>,
        value: ExprLoc,
        position: CodeRange,
    },
    If {
        test: ExprLoc,
        body: Vec<Node>,
        or_else: Vec<Node>,
        position: CodeRange,
    },
    FunctionDef(FunctionDef),
    Global {
        names: Vec<String>,
        position: CodeRange,
    },
    /// Any statement kind without a lowering, named after the source construct.
    Unsupported {
        kind: &'static str,
        position: CodeRange,
    },
}
