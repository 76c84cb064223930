//! Formula interpreter.
//!
//! Walks an [`Expr`] against a [`Scope`]. Nothing outside the scope is
//! reachable: identifiers resolve to inputs, `seed` or the constants `PI`
//! and `E`, and calls resolve only through the [`FunctionRegistry`].

use std::f64::consts;
use std::fmt;

use genesis_procedural::{PropertyMap, PropertyValue};

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::functions::FunctionRegistry;
use super::FormulaError;

/// A value produced while evaluating a formula.
#[derive(Clone, Debug, PartialEq)]
pub enum FormulaValue {
    /// Number.
    Number(f64),
    /// Boolean.
    Bool(bool),
    /// Text.
    Text(String),
    /// List literal.
    List(Vec<FormulaValue>),
}

impl FormulaValue {
    /// Short name of the value kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Bool(_) => "boolean",
            Self::Text(_) => "text",
            Self::List(_) => "list",
        }
    }

    /// Truthiness used by `!`, `&&`, `||` and `?:`.
    ///
    /// Zero, NaN, `false` and empty text are falsy; lists are always truthy.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Bool(b) => *b,
            Self::Text(s) => !s.is_empty(),
            Self::List(_) => true,
        }
    }

    /// Numeric view; booleans count as 0 and 1.
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(f64::from(u8::from(*b))),
            Self::Text(_) | Self::List(_) => None,
        }
    }

    /// Converts a generated property into a formula value.
    ///
    /// String and discrete properties both become text.
    #[must_use]
    pub fn from_property(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::Number(n) => Self::Number(*n),
            PropertyValue::Boolean(b) => Self::Bool(*b),
            PropertyValue::String(s) | PropertyValue::Discrete(s) => Self::Text(s.clone()),
        }
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<f64> for FormulaValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for FormulaValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FormulaValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Everything a formula can see.
#[derive(Clone, Copy, Debug)]
pub struct Scope<'a> {
    /// Resolved input properties.
    pub inputs: &'a PropertyMap,
    /// Seed of the entity being generated, bound to `seed`.
    pub seed: &'a str,
    /// Callable functions.
    pub functions: &'a FunctionRegistry,
}

impl Scope<'_> {
    fn lookup(&self, name: &str) -> Result<FormulaValue, FormulaError> {
        if let Some(value) = self.inputs.get(name) {
            return Ok(FormulaValue::from_property(value));
        }
        match name {
            "seed" => Ok(FormulaValue::Text(self.seed.to_string())),
            "PI" => Ok(FormulaValue::Number(consts::PI)),
            "E" => Ok(FormulaValue::Number(consts::E)),
            _ => Err(FormulaError::UnknownIdentifier(name.to_string())),
        }
    }
}

/// Names that resolve without being declared as inputs.
pub const AMBIENT_IDENTIFIERS: [&str; 3] = ["seed", "PI", "E"];

/// Evaluates `expr` in `scope`.
///
/// # Errors
///
/// Returns a [`FormulaError`] for unknown names, wrong argument counts or
/// operand kinds. Non-finite results are not checked here.
pub fn evaluate(expr: &Expr, scope: &Scope<'_>) -> Result<FormulaValue, FormulaError> {
    match expr {
        Expr::Number(n) => Ok(FormulaValue::Number(*n)),
        Expr::Text(s) => Ok(FormulaValue::Text(s.clone())),
        Expr::Bool(b) => Ok(FormulaValue::Bool(*b)),
        Expr::Ident(name) => scope.lookup(name),
        Expr::List(items) => items
            .iter()
            .map(|item| evaluate(item, scope))
            .collect::<Result<_, _>>()
            .map(FormulaValue::List),
        Expr::Unary { op, expr } => {
            let value = evaluate(expr, scope)?;
            match op {
                UnaryOp::Not => Ok(FormulaValue::Bool(!value.truthy())),
                UnaryOp::Neg => Ok(FormulaValue::Number(-operand("-", &value)?)),
                UnaryOp::Plus => Ok(FormulaValue::Number(operand("+", &value)?)),
            }
        }
        Expr::Binary { op, lhs, rhs } => binary(*op, lhs, rhs, scope),
        Expr::Conditional {
            cond,
            then,
            otherwise,
        } => {
            if evaluate(cond, scope)?.truthy() {
                evaluate(then, scope)
            } else {
                evaluate(otherwise, scope)
            }
        }
        Expr::Call { name, args } => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            scope.functions.call(name, &args)
        }
    }
}

fn operand(operator: &str, value: &FormulaValue) -> Result<f64, FormulaError> {
    value.as_number().ok_or_else(|| {
        FormulaError::Type(format!("operator {operator} needs numbers, got {}", value.kind()))
    })
}

fn binary(op: BinaryOp, lhs: &Expr, rhs: &Expr, scope: &Scope<'_>) -> Result<FormulaValue, FormulaError> {
    let left = evaluate(lhs, scope)?;

    // Short-circuit operators return an operand, not a boolean
    match op {
        BinaryOp::And if !left.truthy() => return Ok(left),
        BinaryOp::Or if left.truthy() => return Ok(left),
        BinaryOp::And | BinaryOp::Or => return evaluate(rhs, scope),
        _ => {}
    }

    let right = evaluate(rhs, scope)?;

    let value = match op {
        BinaryOp::Add => {
            if matches!(left, FormulaValue::Text(_)) || matches!(right, FormulaValue::Text(_)) {
                return Ok(FormulaValue::Text(format!("{left}{right}")));
            }
            operand("+", &left)? + operand("+", &right)?
        }
        BinaryOp::Sub => operand("-", &left)? - operand("-", &right)?,
        BinaryOp::Mul => operand("*", &left)? * operand("*", &right)?,
        BinaryOp::Div => operand("/", &left)? / operand("/", &right)?,
        BinaryOp::Rem => operand("%", &left)? % operand("%", &right)?,
        BinaryOp::Pow => operand("**", &left)?.powf(operand("**", &right)?),
        BinaryOp::Eq => return Ok(FormulaValue::Bool(left == right)),
        BinaryOp::NotEq => return Ok(FormulaValue::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            return compare(op, &left, &right).map(FormulaValue::Bool);
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    };
    Ok(FormulaValue::Number(value))
}

fn compare(op: BinaryOp, left: &FormulaValue, right: &FormulaValue) -> Result<bool, FormulaError> {
    let ordering = match (left, right) {
        (FormulaValue::Text(a), FormulaValue::Text(b)) => Some(a.cmp(b)),
        _ => operand("comparison", left)?.partial_cmp(&operand("comparison", right)?),
    };
    // NaN compares false with everything
    let Some(ordering) = ordering else {
        return Ok(false);
    };
    Ok(match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::LtEq => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    })
}
