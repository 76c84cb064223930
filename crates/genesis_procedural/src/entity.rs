//! # Procedural Entities
//!
//! A named thing at a path in the seed hierarchy, generated by a
//! property graph.
//!
//! [`ProceduralEntity`] never caches: every `generate` call re-runs the
//! graph. Callers that regenerate the same entities repeatedly go through
//! an [`EntityCache`], which memoizes results by (full seed, graph id).

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::ProceduralResult;
use crate::graph::{EvaluationTrace, GraphId, PropertyGraph};
use crate::lru::LruCache;
use crate::seed::{Seed, SeedManager};
use crate::value::{GroupedProperties, PropertyMap};

/// An entity bound to a seed path and a graph.
///
/// Cheap to create; the seed manager and graph are shared.
#[derive(Clone, Debug)]
pub struct ProceduralEntity {
    name: String,
    path: Vec<String>,
    seeds: Arc<SeedManager>,
    graph: Arc<PropertyGraph>,
    full_seed: OnceLock<Seed>,
}

impl ProceduralEntity {
    /// Creates an entity.
    pub fn new<I, S>(
        name: impl Into<String>,
        path: I,
        seeds: Arc<SeedManager>,
        graph: Arc<PropertyGraph>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            path: path.into_iter().map(Into::into).collect(),
            seeds,
            graph,
            full_seed: OnceLock::new(),
        }
    }

    /// Display name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Seed path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The graph that generates this entity.
    #[must_use]
    pub fn graph(&self) -> &PropertyGraph {
        &self.graph
    }

    /// Seed derived from the path, computed on first use.
    #[must_use]
    pub fn full_seed(&self) -> &Seed {
        self.full_seed
            .get_or_init(|| self.seeds.sub_seed(&self.path))
    }

    /// Evaluates the graph for this entity.
    ///
    /// # Errors
    ///
    /// Propagates [`PropertyGraph::evaluate`] errors.
    pub fn generate(&self) -> ProceduralResult<PropertyMap> {
        self.graph.evaluate(self.full_seed())
    }

    /// Evaluates the graph and groups the values.
    ///
    /// # Errors
    ///
    /// Propagates [`PropertyGraph::evaluate_grouped`] errors.
    pub fn generate_grouped(&self) -> ProceduralResult<GroupedProperties> {
        self.graph.evaluate_grouped(self.full_seed())
    }

    /// Evaluates the graph and records each definition's inputs.
    ///
    /// # Errors
    ///
    /// Propagates [`PropertyGraph::evaluate_with_trace`] errors.
    pub fn generate_trace(&self) -> ProceduralResult<EvaluationTrace> {
        self.graph.evaluate_with_trace(self.full_seed())
    }

    fn cache_key(&self) -> EntityKey {
        (self.full_seed().clone(), self.graph.id())
    }
}

type EntityKey = (Seed, GraphId);

/// Sizes of the entity result stores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EntityCacheStats {
    /// Cached flat results.
    pub flat: usize,
    /// Cached grouped results.
    pub grouped: usize,
    /// Cached traces.
    pub trace: usize,
    /// Capacity of each store.
    pub capacity: usize,
}

/// Memoized entity generation.
///
/// Results are keyed by the entity's full seed and its graph's identity,
/// so two entities at the same path with the same graph share an entry.
/// Failed evaluations are not cached.
#[derive(Debug)]
pub struct EntityCache {
    flat: Mutex<LruCache<EntityKey, PropertyMap>>,
    grouped: Mutex<LruCache<EntityKey, GroupedProperties>>,
    trace: Mutex<LruCache<EntityKey, EvaluationTrace>>,
}

impl Default for EntityCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl EntityCache {
    /// Default capacity of each store.
    pub const DEFAULT_CAPACITY: usize = 500;

    /// Creates a cache whose three stores each hold `capacity` results.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            flat: Mutex::new(LruCache::new(capacity)),
            grouped: Mutex::new(LruCache::new(capacity)),
            trace: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Cached [`ProceduralEntity::generate`].
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors.
    pub fn generate(&self, entity: &ProceduralEntity) -> ProceduralResult<PropertyMap> {
        memoize(&self.flat, entity, ProceduralEntity::generate)
    }

    /// Cached [`ProceduralEntity::generate_grouped`].
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors.
    pub fn generate_grouped(&self, entity: &ProceduralEntity) -> ProceduralResult<GroupedProperties> {
        memoize(&self.grouped, entity, ProceduralEntity::generate_grouped)
    }

    /// Cached [`ProceduralEntity::generate_trace`].
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors.
    pub fn generate_trace(&self, entity: &ProceduralEntity) -> ProceduralResult<EvaluationTrace> {
        memoize(&self.trace, entity, ProceduralEntity::generate_trace)
    }

    /// Drops every cached result.
    pub fn clear(&self) {
        self.flat.lock().clear();
        self.grouped.lock().clear();
        self.trace.lock().clear();
    }

    /// Current store sizes.
    #[must_use]
    pub fn stats(&self) -> EntityCacheStats {
        let flat = self.flat.lock();
        EntityCacheStats {
            flat: flat.len(),
            grouped: self.grouped.lock().len(),
            trace: self.trace.lock().len(),
            capacity: flat.capacity(),
        }
    }
}

fn memoize<T: Clone>(
    store: &Mutex<LruCache<EntityKey, T>>,
    entity: &ProceduralEntity,
    generate: impl FnOnce(&ProceduralEntity) -> ProceduralResult<T>,
) -> ProceduralResult<T> {
    let key = entity.cache_key();
    if let Some(hit) = store.lock().get(&key) {
        return Ok(hit.clone());
    }

    let value = generate(entity)?;
    store.lock().insert(key, value.clone());
    Ok(value)
}
