//! # Formula Functions
//!
//! The closed set of functions a formula may call. Built-ins cover
//! math, interpolation and seeded noise; hosts add their own with
//! [`FunctionRegistry::register`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use genesis_procedural::{advanced_noise01_with, map_exp, noise01, NoiseEngine, NoiseSource};

use super::eval::FormulaValue;
use super::FormulaError;

/// A callable formula function.
pub type FormulaFn = Arc<dyn Fn(&[FormulaValue]) -> Result<FormulaValue, FormulaError> + Send + Sync>;

/// Accepted argument counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many.
    Exact(usize),
    /// This many or more.
    AtLeast(usize),
    /// Inclusive range.
    Between(usize, usize),
}

impl Arity {
    /// Whether `count` arguments are accepted.
    #[inline]
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::AtLeast(n) => count >= n,
            Self::Between(min, max) => count >= min && count <= max,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
            Self::Between(min, max) => write!(f, "{min} to {max}"),
        }
    }
}

#[derive(Clone)]
struct Entry {
    arity: Arity,
    function: FormulaFn,
}

/// Named functions available to formulas.
#[derive(Clone)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Entry>,
}

impl FunctionRegistry {
    /// Registry with no functions at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }

    /// Registry with every built-in; `advancedNoise` samples `engine`.
    #[must_use]
    pub fn with_builtins(engine: NoiseEngine) -> Self {
        let mut registry = Self::empty();

        for (name, op) in [
            ("sin", f64::sin as fn(f64) -> f64),
            ("cos", f64::cos),
            ("tan", f64::tan),
            ("sqrt", f64::sqrt),
            ("abs", f64::abs),
            ("floor", f64::floor),
            ("ceil", f64::ceil),
            ("log", f64::ln),
            ("exp", f64::exp),
            // Halves round toward positive infinity
            ("round", |x: f64| (x + 0.5).floor()),
        ] {
            registry.register(name, Arity::Exact(1), move |args| {
                Ok(FormulaValue::Number(op(number(name, args, 0)?)))
            });
        }

        registry.register("pow", Arity::Exact(2), |args| {
            Ok(FormulaValue::Number(number("pow", args, 0)?.powf(number("pow", args, 1)?)))
        });
        registry.register("min", Arity::AtLeast(1), |args| fold("min", args, f64::min));
        registry.register("max", Arity::AtLeast(1), |args| fold("max", args, f64::max));

        registry.register("clamp", Arity::Exact(3), |args| {
            let [value, min, max] = numbers::<3>("clamp", args)?;
            Ok(FormulaValue::Number(min.max(max.min(value))))
        });
        registry.register("lerp", Arity::Exact(3), |args| {
            let [a, b, t] = numbers::<3>("lerp", args)?;
            Ok(FormulaValue::Number(a + t * (b - a)))
        });
        registry.register("smoothstep", Arity::Exact(3), |args| {
            let [edge0, edge1, x] = numbers::<3>("smoothstep", args)?;
            let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
            Ok(FormulaValue::Number(t * t * (3.0 - 2.0 * t)))
        });
        registry.register("mapRange", Arity::Exact(5), |args| {
            let [value, in_min, in_max, out_min, out_max] = numbers::<5>("mapRange", args)?;
            Ok(FormulaValue::Number(
                out_min + (value - in_min) * (out_max - out_min) / (in_max - in_min),
            ))
        });
        registry.register("mapExp", Arity::Between(2, 3), |args| {
            let [value, base] = numbers::<2>("mapExp", args)?;
            let range = match args.get(2) {
                None => None,
                Some(FormulaValue::List(bounds)) => match bounds.as_slice() {
                    [min, max] => Some((
                        list_number("mapExp", min)?,
                        list_number("mapExp", max)?,
                    )),
                    _ => {
                        return Err(FormulaError::Type(
                            "mapExp range must be a [min, max] list".to_string(),
                        ))
                    }
                },
                Some(other) => {
                    return Err(FormulaError::Type(format!(
                        "mapExp range must be a list, got {}",
                        other.kind()
                    )))
                }
            };
            Ok(FormulaValue::Number(map_exp(value, base, range)))
        });

        registry.register("noise", Arity::Exact(2), |args| {
            Ok(FormulaValue::Number(noise01(&text(args, 0), &text(args, 1))))
        });
        registry.register("advancedNoise", Arity::Exact(3), move |args| {
            let source = text(args, 2)
                .parse::<NoiseSource>()
                .map_err(FormulaError::Type)?;
            Ok(FormulaValue::Number(advanced_noise01_with(
                &engine,
                &text(args, 0),
                &text(args, 1),
                source,
            )))
        });
        registry.register("randomChoice", Arity::Exact(3), |args| {
            let Some(FormulaValue::List(options)) = args.get(2) else {
                return Err(FormulaError::Type(
                    "randomChoice options must be a list".to_string(),
                ));
            };
            if options.is_empty() {
                return Err(FormulaError::Type(
                    "randomChoice needs at least one option".to_string(),
                ));
            }
            let n = noise01(&text(args, 0), &text(args, 1));
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
            let index = ((n * options.len() as f64).floor() as usize).min(options.len() - 1);
            Ok(options[index].clone())
        });

        registry
    }

    /// Adds or replaces a function. Returns `true` if one was replaced.
    pub fn register<F>(&mut self, name: impl Into<String>, arity: Arity, function: F) -> bool
    where
        F: Fn(&[FormulaValue]) -> Result<FormulaValue, FormulaError> + Send + Sync + 'static,
    {
        self.functions
            .insert(
                name.into(),
                Entry {
                    arity,
                    function: Arc::new(function),
                },
            )
            .is_some()
    }

    /// Whether `name` is callable.
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Callable names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Number of callable functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns true if nothing is callable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Calls `name` with already evaluated arguments.
    ///
    /// # Errors
    ///
    /// [`FormulaError::UnknownFunction`] if not registered,
    /// [`FormulaError::Arity`] on a wrong argument count, or whatever the
    /// function itself returns.
    pub fn call(&self, name: &str, args: &[FormulaValue]) -> Result<FormulaValue, FormulaError> {
        let entry = self
            .functions
            .get(name)
            .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;
        if !entry.arity.accepts(args.len()) {
            return Err(FormulaError::Arity {
                function: name.to_string(),
                expected: entry.arity.to_string(),
                found: args.len(),
            });
        }
        (entry.function)(args)
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtins(NoiseEngine::global().clone())
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}

/// Numeric argument `index` of `function`.
fn number(function: &str, args: &[FormulaValue], index: usize) -> Result<f64, FormulaError> {
    let value = args.get(index).ok_or_else(|| FormulaError::Arity {
        function: function.to_string(),
        expected: format!("at least {}", index + 1),
        found: args.len(),
    })?;
    value.as_number().ok_or_else(|| {
        FormulaError::Type(format!(
            "{function} argument {} must be a number, got {}",
            index + 1,
            value.kind()
        ))
    })
}

/// The first `N` arguments of `function` as numbers.
fn numbers<const N: usize>(function: &str, args: &[FormulaValue]) -> Result<[f64; N], FormulaError> {
    let mut out = [0.0; N];
    for (index, slot) in out.iter_mut().enumerate() {
        *slot = number(function, args, index)?;
    }
    Ok(out)
}

fn list_number(function: &str, value: &FormulaValue) -> Result<f64, FormulaError> {
    value.as_number().ok_or_else(|| {
        FormulaError::Type(format!("{function} range bounds must be numbers, got {}", value.kind()))
    })
}

fn fold(function: &str, args: &[FormulaValue], op: fn(f64, f64) -> f64) -> Result<FormulaValue, FormulaError> {
    let mut acc = number(function, args, 0)?;
    for index in 1..args.len() {
        let n = number(function, args, index)?;
        // NaN is contagious, as in the usual min/max semantics
        acc = if n.is_nan() || acc.is_nan() { f64::NAN } else { op(acc, n) };
    }
    Ok(FormulaValue::Number(acc))
}

/// Text form of argument `index`; absent arguments are empty.
fn text(args: &[FormulaValue], index: usize) -> String {
    args.get(index).map(ToString::to_string).unwrap_or_default()
}
