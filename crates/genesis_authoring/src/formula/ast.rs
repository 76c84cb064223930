//! Formula syntax tree.

use std::collections::BTreeSet;

/// Prefix operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Plus,
    /// `!x`
    Not,
}

/// Infix operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `**`
    Pow,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `&&`
    And,
    /// `||`
    Or,
}

/// A parsed formula expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// String literal.
    Text(String),
    /// `true` / `false`.
    Bool(bool),
    /// Variable reference.
    Ident(String),
    /// `[a, b, ...]`
    List(Vec<Expr>),
    /// Prefix operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        expr: Box<Expr>,
    },
    /// Infix operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// `cond ? then : otherwise`
    Conditional {
        /// Condition.
        cond: Box<Expr>,
        /// Value when truthy.
        then: Box<Expr>,
        /// Value when falsy.
        otherwise: Box<Expr>,
    },
    /// `name(args...)`
    Call {
        /// Function name.
        name: String,
        /// Arguments.
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Variable names referenced anywhere in the expression.
    ///
    /// Function names are not included.
    #[must_use]
    pub fn identifiers(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.walk(&mut |expr| {
            if let Self::Ident(name) = expr {
                out.insert(name.as_str());
            }
        });
        out
    }

    /// Function names called anywhere in the expression.
    #[must_use]
    pub fn functions(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.walk(&mut |expr| {
            if let Self::Call { name, .. } = expr {
                out.insert(name.as_str());
            }
        });
        out
    }

    /// Visits every node, parents before children.
    fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Self)) {
        visit(self);
        match self {
            Self::Number(_) | Self::Text(_) | Self::Bool(_) | Self::Ident(_) => {}
            Self::List(items) | Self::Call { args: items, .. } => {
                for item in items {
                    item.walk(visit);
                }
            }
            Self::Unary { expr, .. } => expr.walk(visit),
            Self::Binary { lhs, rhs, .. } => {
                lhs.walk(visit);
                rhs.walk(visit);
            }
            Self::Conditional {
                cond,
                then,
                otherwise,
            } => {
                cond.walk(visit);
                then.walk(visit);
                otherwise.walk(visit);
            }
        }
    }
}
