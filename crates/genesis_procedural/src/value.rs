//! # Property Values
//!
//! Generated attributes are one of four kinds. Consumers match on
//! [`PropertyValue`] exhaustively instead of testing types at runtime.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;

/// A single generated value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    /// Continuous numeric value.
    Number(f64),
    /// Flag.
    Boolean(bool),
    /// Free-form text.
    String(String),
    /// One option out of a closed list.
    Discrete(String),
}

impl PropertyValue {
    /// Short name of the value kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::String(_) => "string",
            Self::Discrete(_) => "discrete",
        }
    }

    /// Returns the numeric value, if this is a number.
    #[inline]
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the flag, if this is a boolean.
    #[inline]
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the text of a string or discrete value.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Discrete(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) | Self::Discrete(s) => f.write_str(s),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// Ordered map from property id to value.
///
/// Used both for full evaluation results and for the input sub-map handed
/// to each compute function.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyMap(BTreeMap<String, PropertyValue>);

impl PropertyMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(&mut self, id: impl Into<String>, value: PropertyValue) -> Option<PropertyValue> {
        self.0.insert(id.into(), value)
    }

    /// Returns the value for an id.
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PropertyValue> {
        self.0.get(id)
    }

    /// Returns true if the id is present.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the map is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in id order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, PropertyValue> {
        self.0.iter()
    }

    /// Iterates ids in order.
    pub fn keys(&self) -> btree_map::Keys<'_, String, PropertyValue> {
        self.0.keys()
    }

    /// Numeric value of an id, if present and numeric.
    #[must_use]
    pub fn number(&self, id: &str) -> Option<f64> {
        self.get(id).and_then(PropertyValue::as_number)
    }

    /// Boolean value of an id, if present and boolean.
    #[must_use]
    pub fn boolean(&self, id: &str) -> Option<bool> {
        self.get(id).and_then(PropertyValue::as_bool)
    }

    /// Text of a string or discrete id, if present.
    #[must_use]
    pub fn text(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(PropertyValue::as_text)
    }

    /// Numeric value of an id.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError`] if the id is absent or not a number.
    pub fn require_number(&self, id: &str) -> Result<f64, ComputeError> {
        let value = self.require(id)?;
        value.as_number().ok_or_else(|| wrong_kind(id, "number", value))
    }

    /// Boolean value of an id.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError`] if the id is absent or not a boolean.
    pub fn require_bool(&self, id: &str) -> Result<bool, ComputeError> {
        let value = self.require(id)?;
        value.as_bool().ok_or_else(|| wrong_kind(id, "boolean", value))
    }

    /// Text of a string or discrete id.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError`] if the id is absent or not textual.
    pub fn require_text(&self, id: &str) -> Result<&str, ComputeError> {
        let value = self.require(id)?;
        value.as_text().ok_or_else(|| wrong_kind(id, "text", value))
    }

    fn require(&self, id: &str) -> Result<&PropertyValue, ComputeError> {
        self.get(id)
            .ok_or_else(|| ComputeError::MissingInput(id.to_string()))
    }
}

fn wrong_kind(id: &str, expected: &'static str, found: &PropertyValue) -> ComputeError {
    ComputeError::WrongKind {
        input: id.to_string(),
        expected,
        found: found.kind(),
    }
}

impl<'a> IntoIterator for &'a PropertyMap {
    type Item = (&'a String, &'a PropertyValue);
    type IntoIter = btree_map::Iter<'a, String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for PropertyMap {
    type Item = (String, PropertyValue);
    type IntoIter = btree_map::IntoIter<String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, PropertyValue)> for PropertyMap {
    fn from_iter<T: IntoIterator<Item = (K, PropertyValue)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl std::ops::Index<&str> for PropertyMap {
    type Output = PropertyValue;

    fn index(&self, id: &str) -> &Self::Output {
        &self.0[id]
    }
}

/// Evaluation results re-keyed by group, then by id.
pub type GroupedProperties = BTreeMap<String, PropertyMap>;
