//! # GENESIS
//!
//! Procedural planets on top of the GENESIS engine.
//!
//! ## Core Components
//!
//! - `planet`: the planet property graph, hand-written and declarative
//!
//! The `planet_forge` binary prints a planet for any seed path.
//!
//! ## Example
//!
//! ```rust
//! use genesis::planet::planet_graph;
//! use genesis_procedural::SeedManager;
//!
//! let graph = planet_graph()?;
//! let seed = SeedManager::new("GenesisAlpha42").sub_seed(&["Galaxy", "System7", "Planet3"]);
//! let planet = graph.evaluate(&seed)?;
//! assert!(planet.number("gravity").is_some());
//! # Ok::<(), genesis_procedural::ProceduralError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod planet;

pub use planet::{
    atmosphere_subsystem, basic_subsystem, climate_subsystem, geology_subsystem,
    planet_definitions, planet_graph, planet_system_template, PLANET_SYSTEM, PLANET_TEMPLATE,
};
