//! # Spatial Noise Cache
//!
//! Bounded LRU store of sampled noise values with a coarse spatial index.
//!
//! ## Keys
//!
//! A key is the full [`NoiseConfig`] fingerprint plus the sample
//! coordinates quantized to six fractional digits, so two samples that
//! differ only past the sixth decimal share an entry.
//!
//! ## Grid Index
//!
//! Every stored key is also filed under the grid cell that contains it
//! (`floor(coord / grid_size)` per axis). Evicting a key removes it from
//! its cell, and a cell that becomes empty is dropped.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{ProceduralError, ProceduralResult};
use crate::lru::LruCache;
use crate::noise::NoiseConfig;

/// Fixed-point scale used to quantize coordinates (six fractional digits).
const QUANTUM: f64 = 1_000_000.0;

/// Cache sizing, loadable from TOML.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseCacheConfig {
    /// Maximum number of cached samples.
    pub max_size: usize,
    /// Edge length of one grid index cell, in world units.
    pub grid_size: f64,
}

impl Default for NoiseCacheConfig {
    fn default() -> Self {
        Self {
            max_size: 50_000,
            grid_size: 10.0,
        }
    }
}

impl NoiseCacheConfig {
    /// Parses a configuration from TOML text.
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidConfig`] if the text is not valid
    /// TOML or a value is out of range.
    pub fn from_toml_str(text: &str) -> ProceduralResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ProceduralError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that sizes are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidConfig`] for a zero `max_size` or a
    /// non-positive `grid_size`.
    pub fn validate(&self) -> ProceduralResult<()> {
        if self.max_size == 0 {
            return Err(ProceduralError::InvalidConfig(
                "max_size must be at least 1".to_string(),
            ));
        }
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(ProceduralError::InvalidConfig(format!(
                "grid_size must be positive, got {}",
                self.grid_size
            )));
        }
        Ok(())
    }
}

/// Identity of one cached sample.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NoiseCacheKey {
    config: String,
    x: i64,
    y: i64,
    z: i64,
}

impl NoiseCacheKey {
    /// Builds the key for a sample.
    #[must_use]
    pub fn new(config: &NoiseConfig, x: f64, y: f64, z: f64) -> Self {
        Self {
            config: config.fingerprint(),
            x: quantize(x),
            y: quantize(y),
            z: quantize(z),
        }
    }

    /// Grid cell containing this key's (quantized) position.
    #[must_use]
    pub fn cell(&self, grid_size: f64) -> GridCell {
        GridCell::containing(
            dequantize(self.x),
            dequantize(self.y),
            dequantize(self.z),
            grid_size,
        )
    }
}

#[inline]
fn quantize(v: f64) -> i64 {
    (v * QUANTUM).round() as i64
}

#[inline]
fn dequantize(q: i64) -> f64 {
    q as f64 / QUANTUM
}

/// Coarse spatial cell of the grid index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    /// Cell index along X.
    pub x: i64,
    /// Cell index along Y.
    pub y: i64,
    /// Cell index along Z.
    pub z: i64,
}

impl GridCell {
    /// The cell containing a world position.
    #[must_use]
    pub fn containing(x: f64, y: f64, z: f64, grid_size: f64) -> Self {
        Self {
            x: (x / grid_size).floor() as i64,
            y: (y / grid_size).floor() as i64,
            z: (z / grid_size).floor() as i64,
        }
    }
}

/// Snapshot of cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NoiseCacheStats {
    /// Entries currently stored.
    pub size: usize,
    /// Capacity.
    pub max_size: usize,
    /// Occupied grid cells.
    pub grid_cells: usize,
    /// Lookups that found a value.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Entries dropped to make room.
    pub evictions: u64,
}

impl NoiseCacheStats {
    /// Fraction of lookups that hit, or 0 when nothing was looked up.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded cache of noise samples with a spatial grid index.
#[derive(Debug)]
pub struct SpatialNoiseCache {
    grid_size: f64,
    entries: LruCache<NoiseCacheKey, f64>,
    grid: HashMap<GridCell, HashSet<NoiseCacheKey>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Default for SpatialNoiseCache {
    fn default() -> Self {
        Self::new(&NoiseCacheConfig::default())
    }
}

impl SpatialNoiseCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(config: &NoiseCacheConfig) -> Self {
        Self {
            grid_size: config.grid_size,
            entries: LruCache::new(config.max_size),
            grid: HashMap::new(),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Looks up a sample.
    ///
    /// Always `None` when `config.cache` is false. A hit marks the entry
    /// most-recently-used.
    pub fn get(&mut self, config: &NoiseConfig, x: f64, y: f64, z: f64) -> Option<f64> {
        if !config.cache {
            return None;
        }
        let key = NoiseCacheKey::new(config, x, y, z);
        if let Some(&value) = self.entries.get(&key) {
            self.hits += 1;
            Some(value)
        } else {
            self.misses += 1;
            None
        }
    }

    /// Stores a sample.
    ///
    /// No-op when `config.cache` is false. At capacity the least recently
    /// used entry is evicted and unfiled from the grid index.
    pub fn set(&mut self, config: &NoiseConfig, x: f64, y: f64, z: f64, value: f64) {
        if !config.cache {
            return;
        }
        let key = NoiseCacheKey::new(config, x, y, z);
        let cell = key.cell(self.grid_size);

        if let Some((evicted, _)) = self.entries.insert(key.clone(), value) {
            self.evictions += 1;
            self.unfile(&evicted);
            tracing::trace!(evictions = self.evictions, "noise cache evicted entry");
        }

        self.grid.entry(cell).or_default().insert(key);
    }

    fn unfile(&mut self, key: &NoiseCacheKey) {
        let cell = key.cell(self.grid_size);
        if let Some(keys) = self.grid.get_mut(&cell) {
            keys.remove(key);
            if keys.is_empty() {
                self.grid.remove(&cell);
            }
        }
    }

    /// Drops every entry and resets the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.grid.clear();
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
    }

    /// Number of stored samples.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of keys filed under a grid cell.
    #[must_use]
    pub fn keys_in_cell(&self, cell: GridCell) -> usize {
        self.grid.get(&cell).map_or(0, HashSet::len)
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> NoiseCacheStats {
        NoiseCacheStats {
            size: self.entries.len(),
            max_size: self.entries.capacity(),
            grid_cells: self.grid.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}
