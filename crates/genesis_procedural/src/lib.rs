//! # GENESIS Procedural Core
//!
//! Deterministic synthesis of interdependent attributes from a root seed
//! and a naming path.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same root and path always produce the same values
//! 2. **Declarative**: Properties name their inputs; the graph orders them
//! 3. **Pure**: A compute function sees only its inputs and its seed
//! 4. **Bounded**: Every cache has a fixed capacity
//!
//! ## Core Components
//!
//! - `SeedManager`: hierarchical sub-seed derivation
//! - `PropertyGraph`: dependency-resolved evaluation
//! - `ProceduralEntity`: an entity bound to a seed path and a graph
//! - `NoiseEngine`: Perlin, Simplex, Worley, fractal and ridged noise with
//!   a spatial LRU cache
//! - `utils`: hash noise and mapping helpers for compute functions
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use genesis_procedural::{
//!     noise01, ProceduralEntity, PropertyDefinition, PropertyGraph, PropertyValue, SeedManager,
//! };
//!
//! let graph = PropertyGraph::new(vec![
//!     PropertyDefinition::new("mass", |inputs, _| {
//!         Ok(PropertyValue::Number(inputs.require_number("radius")?.powi(3)))
//!     })
//!     .with_inputs(["radius"]),
//!     PropertyDefinition::new("radius", |_, seed| {
//!         Ok(PropertyValue::Number(0.5 + 2.5 * noise01(seed.as_str(), "radius")))
//!     }),
//! ])?;
//!
//! let seeds = Arc::new(SeedManager::new("GenesisAlpha42"));
//! let planet = ProceduralEntity::new("Planet3", ["Galaxy", "System7", "Planet3"], seeds, Arc::new(graph));
//! let values = planet.generate()?;
//! assert!(values.number("mass").is_some());
//! # Ok::<(), genesis_procedural::ProceduralError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cache;
pub mod entity;
pub mod error;
pub mod graph;
pub mod lru;
pub mod noise;
pub mod seed;
pub mod utils;
pub mod value;

pub use cache::{GridCell, NoiseCacheConfig, NoiseCacheStats, SpatialNoiseCache};
pub use entity::{EntityCache, EntityCacheStats, ProceduralEntity};
pub use error::{ComputeError, ProceduralError, ProceduralResult};
pub use graph::{ComputeFn, EvaluationTrace, GraphId, PropertyDefinition, PropertyGraph, DEFAULT_GROUP};
pub use lru::LruCache;
pub use noise::{
    batch_noise_3d, clear_noise_cache, domain_warp_3d, noise_3d, noise_cache_stats, NoiseAlgorithm,
    NoiseConfig, NoiseEngine, Vec3, DEFAULT_WARP_STRENGTH,
};
pub use seed::{fnv1a_64, Seed, SeedManager};
pub use utils::{
    advanced_noise01, advanced_noise01_with, batch_noise01, map_exp, map_range01, noise01,
    resolve_discrete, NoiseSource,
};
pub use value::{GroupedProperties, PropertyMap, PropertyValue};
