//! # Procedural Error Types
//!
//! All errors that can occur while resolving a property graph.

use thiserror::Error;

/// Errors that can occur in the procedural core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProceduralError {
    /// Definitions that never became eligible for evaluation.
    ///
    /// Covers both a missing input and a true dependency cycle: a cyclic
    /// definition can never see all of its inputs resolved.
    #[error("unresolved properties: {}", pending.join(", "))]
    UnresolvedProperties {
        /// Every still-pending property id, sorted.
        pending: Vec<String>,
    },

    /// Two definitions share the same id.
    #[error("duplicate property id: {0}")]
    DuplicateProperty(String),

    /// A hand-written compute function rejected its inputs.
    #[error("property {property} failed to compute: {reason}")]
    ComputeFailed {
        /// The property being computed.
        property: String,
        /// Why the compute function failed.
        reason: String,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for procedural operations.
pub type ProceduralResult<T> = Result<T, ProceduralError>;

/// Error returned by a compute function.
///
/// The graph wraps it into [`ProceduralError::ComputeFailed`] together with
/// the id of the property being computed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputeError {
    /// A declared input was not present in the input map.
    #[error("missing input {0}")]
    MissingInput(String),

    /// An input had a different kind than expected.
    #[error("input {input} is {found}, expected {expected}")]
    WrongKind {
        /// The offending input id.
        input: String,
        /// Kind the compute function asked for.
        expected: &'static str,
        /// Kind actually present.
        found: &'static str,
    },

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}
