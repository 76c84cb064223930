//! # Authoring Error Types
//!
//! All errors that can occur while building, importing or exporting
//! procedural systems.

use genesis_procedural::ProceduralError;
use thiserror::Error;

/// Errors that can occur in the authoring layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthoringError {
    /// Template has an empty id or name.
    #[error("property template must have id and name")]
    MissingIdentity,

    /// Template lists itself among its inputs.
    #[error("property {0} cannot depend on itself")]
    SelfDependency(String),

    /// Numeric range with `min >= max`.
    #[error("invalid range for {id}: min {min} must be less than max {max}")]
    InvalidRange {
        /// The offending template.
        id: String,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// Discrete template without options.
    #[error("discrete property {0} must have options")]
    MissingOptions(String),

    /// No registered system with this name.
    #[error("system not found: {0}")]
    SystemNotFound(String),

    /// No preset with this name in the system.
    #[error("preset {preset} not found in system {system}")]
    PresetNotFound {
        /// System searched.
        system: String,
        /// Preset requested.
        preset: String,
    },

    /// Structurally invalid system template.
    #[error("invalid system template: {0}")]
    InvalidSystem(String),

    /// Text could not be parsed as a system template.
    #[error("failed to parse system template: {0}")]
    Parse(String),

    /// A system template could not be written out.
    #[error("failed to serialize system template: {0}")]
    Serialize(String),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error from the procedural core.
    #[error(transparent)]
    Procedural(#[from] ProceduralError),
}

/// Result type for authoring operations.
pub type AuthoringResult<T> = Result<T, AuthoringError>;
