//! # Property and System Templates
//!
//! Serializable descriptions of generated attributes. A
//! [`PropertyTemplate`] says what a property is called, what it reads,
//! how it is computed and what kind of value it produces. A
//! [`SystemTemplate`] is an ordered list of them plus named presets.
//!
//! Templates are plain data: they round-trip through TOML and are only
//! turned into compute functions by the builder.

use std::collections::BTreeMap;

use genesis_procedural::{NoiseSource, PropertyValue, DEFAULT_GROUP};
use serde::{Deserialize, Serialize};

use crate::error::{AuthoringError, AuthoringResult};
use crate::formula::{FormulaError, FormulaValue};

/// Fallback text for a discrete output with no usable option.
const UNKNOWN_OPTION: &str = "unknown";

/// Inclusive numeric range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Range {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Range {
    /// Creates a range.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamps `value` into the range.
    #[inline]
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Maps `n` in [0, 1] linearly onto the range.
    #[inline]
    #[must_use]
    pub fn lerp(&self, n: f64) -> f64 {
        self.min + n * (self.max - self.min)
    }
}

/// The kind of value a property produces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputSpec {
    /// Number, clamped into `range` when given.
    Number {
        /// Allowed values.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<Range>,
    },
    /// Flag.
    Boolean,
    /// Free text; the first option, if any, is the noise fallback.
    String {
        /// Suggested values.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        options: Vec<String>,
    },
    /// One of a closed set of options.
    Discrete {
        /// Allowed values.
        #[serde(default)]
        options: Vec<String>,
    },
}

impl OutputSpec {
    /// Unbounded number.
    #[must_use]
    pub const fn number() -> Self {
        Self::Number { range: None }
    }

    /// Number within `[min, max]`.
    #[must_use]
    pub const fn ranged(min: f64, max: f64) -> Self {
        Self::Number {
            range: Some(Range::new(min, max)),
        }
    }

    /// One of `options`.
    #[must_use]
    pub fn discrete<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Discrete {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Kind name, as written in templates.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Number { .. } => "number",
            Self::Boolean => "boolean",
            Self::String { .. } => "string",
            Self::Discrete { .. } => "discrete",
        }
    }

    /// Value used when a formula fails.
    #[must_use]
    pub fn default_value(&self) -> PropertyValue {
        match self {
            Self::Number { range } => PropertyValue::Number(range.map_or(0.0, |r| r.min)),
            Self::Boolean => PropertyValue::Boolean(false),
            Self::Discrete { options } => PropertyValue::Discrete(
                options.first().map_or_else(|| UNKNOWN_OPTION.to_string(), Clone::clone),
            ),
            Self::String { .. } => PropertyValue::String("default".to_string()),
        }
    }

    /// Value for a property with no formula, from noise `n` in [0, 1].
    #[must_use]
    pub fn from_noise(&self, n: f64) -> PropertyValue {
        match self {
            Self::Number { range: Some(range) } => PropertyValue::Number(range.lerp(n)),
            Self::Number { range: None } => PropertyValue::Number(n),
            Self::Boolean => PropertyValue::Boolean(n > 0.5),
            Self::Discrete { options } => PropertyValue::Discrete(
                pick(options, n).map_or_else(|| UNKNOWN_OPTION.to_string(), ToString::to_string),
            ),
            Self::String { options } => PropertyValue::String(
                options.first().map_or_else(|| "generated".to_string(), Clone::clone),
            ),
        }
    }

    /// Converts a formula result into this output kind.
    ///
    /// Numbers are clamped into the range; a discrete result outside the
    /// options falls back to the first option.
    ///
    /// # Errors
    ///
    /// [`FormulaError::Type`] if a number output gets a value with no
    /// numeric reading, [`FormulaError::NonFinite`] if that reading is not
    /// finite.
    pub fn coerce(&self, value: FormulaValue) -> Result<PropertyValue, FormulaError> {
        match self {
            Self::Number { range } => {
                let n = match &value {
                    FormulaValue::Text(s) => s.trim().parse::<f64>().ok(),
                    other => other.as_number(),
                }
                .ok_or_else(|| {
                    FormulaError::Type(format!("expected a number result, got {}", value.kind()))
                })?;
                if !n.is_finite() {
                    return Err(FormulaError::NonFinite);
                }
                Ok(PropertyValue::Number(range.map_or(n, |r| r.clamp(n))))
            }
            Self::Boolean => Ok(PropertyValue::Boolean(value.truthy())),
            Self::Discrete { options } => {
                let text = value.to_string();
                if options.contains(&text) {
                    Ok(PropertyValue::Discrete(text))
                } else {
                    Ok(self.default_value())
                }
            }
            Self::String { .. } => Ok(PropertyValue::String(value.to_string())),
        }
    }
}

/// Option at `floor(n * len)`, clamped to the last one.
fn pick(options: &[String], n: f64) -> Option<&str> {
    let last = options.len().checked_sub(1)?;
    let index = ((n * options.len() as f64).floor().max(0.0) as usize).min(last);
    options.get(index).map(String::as_str)
}

/// Per-property result cache sizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSpec {
    /// Maximum remembered results.
    #[serde(default = "default_cache_size")]
    pub max_size: usize,
    /// Time to live in milliseconds; `None` or `0` keeps results until evicted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_ms: Option<u64>,
}

const fn default_cache_size() -> usize {
    100
}

impl Default for CacheSpec {
    fn default() -> Self {
        Self {
            max_size: default_cache_size(),
            ttl_ms: None,
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_hash(source: &NoiseSource) -> bool {
    *source == NoiseSource::Hash
}

/// Declarative description of one property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyTemplate {
    /// Unique id within a system.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Output group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Ids of the properties this one reads.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,
    /// Formula source; without one the value comes from `noise`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Noise source for formula-less properties.
    #[serde(default, skip_serializing_if = "is_hash")]
    pub noise: NoiseSource,
    /// Output kind.
    pub output: OutputSpec,
    /// Optional result cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheSpec>,
}

impl PropertyTemplate {
    /// Template with no inputs, formula or group.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, output: OutputSpec) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            group: None,
            inputs: Vec::new(),
            formula: None,
            noise: NoiseSource::Hash,
            output,
            cache: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the group.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Sets the inputs.
    #[must_use]
    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the formula.
    #[must_use]
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    /// Sets the noise source.
    #[must_use]
    pub const fn with_noise(mut self, noise: NoiseSource) -> Self {
        self.noise = noise;
        self
    }

    /// Enables the result cache.
    #[must_use]
    pub const fn with_cache(mut self, cache: CacheSpec) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Group name, `"default"` when unset.
    #[must_use]
    pub fn group_or_default(&self) -> &str {
        self.group.as_deref().unwrap_or(DEFAULT_GROUP)
    }

    /// Checks identity, self dependency, range order and options.
    ///
    /// # Errors
    ///
    /// The first rule the template breaks.
    pub fn validate(&self) -> AuthoringResult<()> {
        if self.id.is_empty() || self.name.is_empty() {
            return Err(AuthoringError::MissingIdentity);
        }
        if self.inputs.contains(&self.id) {
            return Err(AuthoringError::SelfDependency(self.id.clone()));
        }
        match &self.output {
            // NaN bounds fail the comparison too
            OutputSpec::Number { range: Some(range) } if !(range.min < range.max) => {
                Err(AuthoringError::InvalidRange {
                    id: self.id.clone(),
                    min: range.min,
                    max: range.max,
                })
            }
            OutputSpec::Discrete { options } if options.is_empty() => {
                Err(AuthoringError::MissingOptions(self.id.clone()))
            }
            _ => Ok(()),
        }
    }
}

/// A value in a preset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PresetValue {
    /// Flag.
    Boolean(bool),
    /// Number.
    Number(f64),
    /// Text; becomes discrete when it overrides a discrete property.
    Text(String),
}

impl PresetValue {
    /// Converts into a property value shaped like `current`.
    #[must_use]
    pub fn to_property(&self, current: &PropertyValue) -> PropertyValue {
        match (self, current) {
            (Self::Boolean(b), _) => PropertyValue::Boolean(*b),
            (Self::Number(n), _) => PropertyValue::Number(*n),
            (Self::Text(s), PropertyValue::Discrete(_)) => PropertyValue::Discrete(s.clone()),
            (Self::Text(s), _) => PropertyValue::String(s.clone()),
        }
    }
}

impl From<&PropertyValue> for PresetValue {
    fn from(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::Number(n) => Self::Number(*n),
            PropertyValue::Boolean(b) => Self::Boolean(*b),
            PropertyValue::String(s) | PropertyValue::Discrete(s) => Self::Text(s.clone()),
        }
    }
}

impl From<f64> for PresetValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for PresetValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for PresetValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Property overrides applied by name.
pub type Preset = BTreeMap<String, PresetValue>;

fn default_version() -> String {
    "1.0.0".to_string()
}

/// A complete procedural system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemTemplate {
    /// Unique system name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Template version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Properties in declaration order.
    #[serde(default)]
    pub properties: Vec<PropertyTemplate>,
    /// Named presets.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub presets: BTreeMap<String, Preset>,
}

impl SystemTemplate {
    /// Empty system at version 1.0.0.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version: default_version(),
            properties: Vec::new(),
            presets: BTreeMap::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends a property.
    #[must_use]
    pub fn with_property(mut self, property: PropertyTemplate) -> Self {
        self.properties.push(property);
        self
    }

    /// Looks up a property by id.
    #[must_use]
    pub fn property(&self, id: &str) -> Option<&PropertyTemplate> {
        self.properties.iter().find(|p| p.id == id)
    }

    /// Checks the name and every property.
    ///
    /// # Errors
    ///
    /// [`AuthoringError::InvalidSystem`] for an unnamed system, otherwise
    /// the first property validation error.
    pub fn validate(&self) -> AuthoringResult<()> {
        if self.name.is_empty() {
            return Err(AuthoringError::InvalidSystem("missing name".to_string()));
        }
        self.properties.iter().try_for_each(PropertyTemplate::validate)
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// [`AuthoringError::Parse`] on malformed TOML or a missing field.
    pub fn from_toml_str(text: &str) -> AuthoringResult<Self> {
        toml::from_str(text).map_err(|e| AuthoringError::Parse(e.to_string()))
    }

    /// Writes a TOML document.
    ///
    /// # Errors
    ///
    /// [`AuthoringError::Serialize`] if a value has no TOML form.
    pub fn to_toml_string(&self) -> AuthoringResult<String> {
        toml::to_string_pretty(self).map_err(|e| AuthoringError::Serialize(e.to_string()))
    }
}
