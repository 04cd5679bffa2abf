//! Stack-machine IR consumed by the backend.
//!
//! The IR is a flat list of operations over an implicit evaluation stack.
//! It is produced by an external front-end; `parse` reads its text form.

pub mod parse;

use std::fmt;
use std::str::FromStr;

// ─── IR Operations ────────────────────────────────────────────────

/// One stack-machine instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackOp {
    /// Read an integer from input and push it.
    Read,
    /// Pop a value and write it to output.
    Write,
    /// Push a constant.
    Const(i32),
    /// Push the value of a global.
    Ld(String),
    /// Pop a value into a global.
    St(String),
    /// Pop right, pop left, push `left op right`.
    Binop(BinOp),
}

impl StackOp {
    /// Stack effect as `(pops, pushes)`.
    pub fn arity(&self) -> (usize, usize) {
        match self {
            StackOp::Read => (0, 1),
            StackOp::Write => (1, 0),
            StackOp::Const(_) => (0, 1),
            StackOp::Ld(_) => (0, 1),
            StackOp::St(_) => (1, 0),
            StackOp::Binop(_) => (2, 1),
        }
    }
}

impl fmt::Display for StackOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackOp::Read => write!(f, "READ"),
            StackOp::Write => write!(f, "WRITE"),
            StackOp::Const(n) => write!(f, "CONST {}", n),
            StackOp::Ld(name) => write!(f, "LD {}", name),
            StackOp::St(name) => write!(f, "ST {}", name),
            StackOp::Binop(op) => write!(f, "BINOP {}", op),
        }
    }
}

// ─── Binary operators ─────────────────────────────────────────────

/// Binary operators accepted by `BINOP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Lowering family of a binary operator. Each family has one fixed
/// instruction template; the payload picks the variant within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpFamily {
    Arithmetic(Additive),
    Logical(Connective),
    Comparison(Relation),
    Multiplicative(Product),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Additive {
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

/// `left <rel> right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Product {
    Mul,
    Quotient,
    Remainder,
}

impl BinOp {
    pub const ALL: [BinOp; 13] = [
        BinOp::Add,
        BinOp::Sub,
        BinOp::Mul,
        BinOp::Div,
        BinOp::Mod,
        BinOp::Eq,
        BinOp::Ne,
        BinOp::Lt,
        BinOp::Le,
        BinOp::Gt,
        BinOp::Ge,
        BinOp::And,
        BinOp::Or,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "!!",
        }
    }

    pub fn family(self) -> OpFamily {
        match self {
            BinOp::Add => OpFamily::Arithmetic(Additive::Add),
            BinOp::Sub => OpFamily::Arithmetic(Additive::Sub),
            BinOp::And => OpFamily::Logical(Connective::And),
            BinOp::Or => OpFamily::Logical(Connective::Or),
            BinOp::Eq => OpFamily::Comparison(Relation::Eq),
            BinOp::Ne => OpFamily::Comparison(Relation::Ne),
            BinOp::Lt => OpFamily::Comparison(Relation::Lt),
            BinOp::Le => OpFamily::Comparison(Relation::Le),
            BinOp::Gt => OpFamily::Comparison(Relation::Gt),
            BinOp::Ge => OpFamily::Comparison(Relation::Ge),
            BinOp::Mul => OpFamily::Multiplicative(Product::Mul),
            BinOp::Div => OpFamily::Multiplicative(Product::Quotient),
            BinOp::Mod => OpFamily::Multiplicative(Product::Remainder),
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Error for a symbol outside the operator set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operator `{}`", self.0)
    }
}

impl FromStr for BinOp {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BinOp::ALL
            .into_iter()
            .find(|op| op.symbol() == s)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

// ─── Tests ────────────────────────────────────────────────────────
