//! # GENESIS Authoring
//!
//! Declarative procedural systems: describe properties as data, build
//! them into [`PropertyGraph`](genesis_procedural::PropertyGraph)s.
//!
//! ## Core Components
//!
//! - `template`: [`PropertyTemplate`] and [`SystemTemplate`], TOML round-trip
//! - `formula`: a sandboxed expression language for computed properties
//! - `builder`: [`ProceduralSystemBuilder`], the system library
//! - `analysis`: static checks with advisory [`ValidationIssue`]s
//!
//! ## Example
//!
//! ```rust
//! use genesis_authoring::{OutputSpec, ProceduralSystemBuilder, PropertyTemplate, SystemTemplate};
//! use genesis_procedural::Seed;
//!
//! let system = SystemTemplate::new("Planets")
//!     .with_property(PropertyTemplate::new("radius", "Radius", OutputSpec::ranged(0.5, 3.0)))
//!     .with_property(
//!         PropertyTemplate::new("mass", "Mass", OutputSpec::number())
//!             .with_inputs(["radius"])
//!             .with_formula("radius ** 3"),
//!     );
//!
//! let mut builder = ProceduralSystemBuilder::new();
//! let graph = builder.create_system(system)?;
//! let values = graph.evaluate(&Seed::from_raw("GenesisAlpha42"))?;
//! assert!(values.number("mass").is_some());
//!
//! let toml = builder.export_system("Planets")?;
//! assert!(toml.contains("radius ** 3"));
//! # Ok::<(), genesis_authoring::AuthoringError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod analysis;
pub mod builder;
pub mod config;
pub mod error;
pub mod formula;
pub mod template;

pub use analysis::{analyze, SystemAnalysis, SystemStatistics, ValidationIssue};
pub use builder::{ProceduralSystemBuilder, DEFAULT_TEST_ENTITY};
pub use config::BuilderConfig;
pub use error::{AuthoringError, AuthoringResult};
pub use formula::{Arity, Formula, FormulaError, FormulaValue, FunctionRegistry};
pub use template::{CacheSpec, OutputSpec, Preset, PresetValue, PropertyTemplate, Range, SystemTemplate};
