//! # Formula Language
//!
//! A small expression language for property templates:
//!
//! ```text
//! radius > 1.5 ? randomChoice(seed, 'crust', ['rocky', 'metallic']) : 'icy'
//! clamp(mass / (radius ** 2) * 9.81, 0.1, 50)
//! ```
//!
//! Source is tokenized, parsed once into an [`Expr`], then interpreted
//! against a [`Scope`]. A formula can read its declared inputs, `seed`,
//! `PI` and `E`, and call the functions in a [`FunctionRegistry`].
//! There is no other way out.

pub mod ast;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;

use std::collections::BTreeSet;

use genesis_procedural::PropertyMap;
use thiserror::Error;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use eval::{FormulaValue, Scope, AMBIENT_IDENTIFIERS};
pub use functions::{Arity, FormulaFn, FunctionRegistry};

/// Errors raised while parsing or evaluating a formula.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    /// Lexical or syntax error.
    #[error("parse error at {position}: {message}")]
    Parse {
        /// Byte offset in the source.
        position: usize,
        /// What went wrong.
        message: String,
    },

    /// Identifier that is neither an input nor a constant.
    #[error("unknown identifier {0}")]
    UnknownIdentifier(String),

    /// Call to an unregistered function.
    #[error("unknown function {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments.
    #[error("{function} expects {expected} arguments, got {found}")]
    Arity {
        /// Function called.
        function: String,
        /// Accepted counts.
        expected: String,
        /// Count given.
        found: usize,
    },

    /// Operand or argument of the wrong kind.
    #[error("type error: {0}")]
    Type(String),

    /// The formula produced NaN or an infinity.
    #[error("formula produced a non-finite number")]
    NonFinite,
}

impl FormulaError {
    /// Parse error at `position`.
    #[must_use]
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }
}

/// A parsed formula.
#[derive(Clone, Debug, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parses `source`.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::Parse`] if the source is not a valid
    /// expression.
    pub fn parse(source: impl Into<String>) -> Result<Self, FormulaError> {
        let source = source.into();
        let expr = parser::parse(&source)?;
        Ok(Self { source, expr })
    }

    /// Original source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed expression.
    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Variable names the formula reads.
    #[must_use]
    pub fn identifiers(&self) -> BTreeSet<&str> {
        self.expr.identifiers()
    }

    /// Functions the formula calls.
    #[must_use]
    pub fn functions(&self) -> BTreeSet<&str> {
        self.expr.functions()
    }

    /// Identifiers that are neither in `declared` nor ambient names.
    pub fn undeclared<'a>(&'a self, declared: &'a [String]) -> impl Iterator<Item = &'a str> {
        self.identifiers().into_iter().filter(move |name| {
            !AMBIENT_IDENTIFIERS.contains(name) && !declared.iter().any(|d| d == name)
        })
    }

    /// Evaluates against `inputs` and `seed`.
    ///
    /// # Errors
    ///
    /// Any evaluation error, or [`FormulaError::NonFinite`] if the result
    /// is a NaN or infinite number.
    pub fn evaluate(
        &self,
        inputs: &PropertyMap,
        seed: &str,
        functions: &FunctionRegistry,
    ) -> Result<FormulaValue, FormulaError> {
        let scope = Scope {
            inputs,
            seed,
            functions,
        };
        let value = eval::evaluate(&self.expr, &scope)?;
        match value {
            FormulaValue::Number(n) if !n.is_finite() => Err(FormulaError::NonFinite),
            value => Ok(value),
        }
    }
}
