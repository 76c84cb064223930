//! # Noise Library
//!
//! Deterministic 3D noise: Perlin, Simplex, Worley, fractal (fBm) and
//! ridged multifractal, plus domain warping.
//!
//! ## Determinism Guarantee
//!
//! Kernels are built on fixed constant tables. Given the same coordinates
//! and [`NoiseConfig`], every call produces **exactly** the same value.
//! The config `seed` only separates cache entries; it does not reshuffle
//! the tables.
//!
//! ## Caching
//!
//! A [`NoiseEngine`] owns a [`SpatialNoiseCache`] behind a mutex. Calls
//! with `config.cache = true` read and populate it. The free functions in
//! this module use a process-wide default engine.

pub mod fractal;
pub mod perlin;
pub mod simplex;
pub mod worley;

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::cache::{NoiseCacheConfig, NoiseCacheStats, SpatialNoiseCache};

/// Default domain warp strength.
pub const DEFAULT_WARP_STRENGTH: f64 = 0.1;

/// Offset applied per axis when sampling warp displacements.
const WARP_OFFSET: f64 = 100.0;

/// Noise algorithm selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseAlgorithm {
    /// Improved Perlin lattice noise.
    #[default]
    Perlin,
    /// Simplex noise.
    Simplex,
    /// Cellular nearest-feature distance.
    Worley,
    /// Fractal Brownian motion.
    Fractal,
    /// Ridged multifractal.
    Ridged,
}

impl NoiseAlgorithm {
    /// All algorithms in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Perlin,
        Self::Simplex,
        Self::Worley,
        Self::Fractal,
        Self::Ridged,
    ];

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Perlin => "perlin",
            Self::Simplex => "simplex",
            Self::Worley => "worley",
            Self::Fractal => "fractal",
            Self::Ridged => "ridged",
        }
    }

    /// Kernel summed by [`fractal::fbm`] when this algorithm is selected.
    #[must_use]
    pub const fn fractal_base(self) -> Self {
        match self {
            Self::Simplex => Self::Simplex,
            Self::Worley => Self::Worley,
            Self::Perlin | Self::Fractal | Self::Ridged => Self::Perlin,
        }
    }

    /// Maps a raw kernel output into [0, 1].
    ///
    /// Signed kernels map `[-1, 1]` linearly, Worley is divided by the cell
    /// diagonal and ridged by the total octave weight of `config`. The
    /// result is clamped.
    #[must_use]
    pub fn normalize01(self, value: f64, config: &NoiseConfig) -> f64 {
        let unit = match self {
            // Fractal always layers Perlin
            Self::Perlin | Self::Simplex | Self::Fractal => (value + 1.0) * 0.5,
            Self::Worley => value / worley::MAX_DISTANCE,
            Self::Ridged => value / config.total_amplitude(),
        };
        if unit.is_nan() {
            0.0
        } else {
            unit.clamp(0.0, 1.0)
        }
    }
}

impl fmt::Display for NoiseAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NoiseAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| format!("unknown noise algorithm: {s}"))
    }
}

/// Parameters of one noise sample.
///
/// Every field participates in cache identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Kernel selector.
    pub algorithm: NoiseAlgorithm,
    /// Input scale applied before sampling.
    pub frequency: f64,
    /// Octave count for fractal and ridged noise.
    pub octaves: u32,
    /// Frequency multiplier per octave.
    pub lacunarity: f64,
    /// Amplitude multiplier per octave.
    pub persistence: f64,
    /// Cache namespace.
    pub seed: String,
    /// Read and populate the engine cache.
    pub cache: bool,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            algorithm: NoiseAlgorithm::Perlin,
            frequency: 1.0,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            seed: String::new(),
            cache: false,
        }
    }
}

impl NoiseConfig {
    /// Default parameters for an algorithm.
    #[must_use]
    pub fn new(algorithm: NoiseAlgorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    /// Sets the frequency.
    #[must_use]
    pub const fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    /// Sets the octave count.
    #[must_use]
    pub const fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves;
        self
    }

    /// Sets the cache namespace.
    #[must_use]
    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = seed.into();
        self
    }

    /// Enables or disables caching.
    #[must_use]
    pub const fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Sum of octave weights (`1 + p + p^2 + ...`).
    #[must_use]
    pub fn total_amplitude(&self) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        for _ in 0..self.octaves.max(1) {
            total += amplitude;
            amplitude *= self.persistence;
        }
        total
    }

    /// Stable text identity of every field.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            self.algorithm,
            self.frequency,
            self.octaves,
            self.lacunarity,
            self.persistence,
            self.seed,
            self.cache
        )
    }

    /// Same parameters with caching off, for sub-octave sampling.
    fn uncached(&self) -> Self {
        Self {
            cache: false,
            ..self.clone()
        }
    }
}

/// Point in 3D sample space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Vec3 {
    /// Creates a point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<(f64, f64, f64)> for Vec3 {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::new(x, y, z)
    }
}

/// Noise sampler with its own cache.
///
/// Cloning shares the cache.
#[derive(Clone, Debug, Default)]
pub struct NoiseEngine {
    cache: Arc<Mutex<SpatialNoiseCache>>,
}

static DEFAULT_ENGINE: OnceLock<NoiseEngine> = OnceLock::new();

impl NoiseEngine {
    /// Creates an engine with an isolated cache.
    #[must_use]
    pub fn new(config: &NoiseCacheConfig) -> Self {
        Self {
            cache: Arc::new(Mutex::new(SpatialNoiseCache::new(config))),
        }
    }

    /// The process-wide engine used by the free functions.
    pub fn global() -> &'static Self {
        DEFAULT_ENGINE.get_or_init(Self::default)
    }

    /// Returns the cached value or computes and stores it.
    ///
    /// The lock is not held while `compute` runs.
    fn cached(
        &self,
        config: &NoiseConfig,
        point: (f64, f64, f64),
        compute: impl FnOnce() -> f64,
    ) -> f64 {
        if !config.cache {
            return compute();
        }
        let (x, y, z) = point;
        if let Some(value) = self.cache.lock().get(config, x, y, z) {
            return value;
        }
        let value = compute();
        self.cache.lock().set(config, x, y, z, value);
        value
    }

    /// 3D Perlin noise, roughly in [-1, 1].
    #[must_use]
    pub fn perlin_3d(&self, x: f64, y: f64, z: f64, config: &NoiseConfig) -> f64 {
        let f = config.frequency;
        let (x, y, z) = (x * f, y * f, z * f);
        self.cached(config, (x, y, z), || perlin::sample(x, y, z))
    }

    /// 3D Simplex noise, roughly in [-1, 1].
    #[must_use]
    pub fn simplex_3d(&self, x: f64, y: f64, z: f64, config: &NoiseConfig) -> f64 {
        let f = config.frequency;
        let (x, y, z) = (x * f, y * f, z * f);
        self.cached(config, (x, y, z), || simplex::sample(x, y, z))
    }

    /// 3D Worley noise, non-negative.
    #[must_use]
    pub fn worley_3d(&self, x: f64, y: f64, z: f64, config: &NoiseConfig) -> f64 {
        let f = config.frequency;
        let (x, y, z) = (x * f, y * f, z * f);
        self.cached(config, (x, y, z), || worley::sample(x, y, z))
    }

    /// Fractal Brownian motion normalized by total amplitude.
    #[must_use]
    pub fn fractal_3d(&self, x: f64, y: f64, z: f64, config: &NoiseConfig) -> f64 {
        self.cached(config, (x, y, z), || fractal::fbm(x, y, z, &config.uncached()))
    }

    /// Ridged multifractal, non-negative and not normalized.
    #[must_use]
    pub fn ridged_3d(&self, x: f64, y: f64, z: f64, config: &NoiseConfig) -> f64 {
        self.cached(config, (x, y, z), || {
            fractal::ridged(x, y, z, &config.uncached())
        })
    }

    /// Dispatches on `config.algorithm`.
    #[must_use]
    pub fn noise_3d(&self, x: f64, y: f64, z: f64, config: &NoiseConfig) -> f64 {
        match config.algorithm {
            NoiseAlgorithm::Perlin => self.perlin_3d(x, y, z, config),
            NoiseAlgorithm::Simplex => self.simplex_3d(x, y, z, config),
            NoiseAlgorithm::Worley => self.worley_3d(x, y, z, config),
            NoiseAlgorithm::Fractal => self.fractal_3d(x, y, z, config),
            NoiseAlgorithm::Ridged => self.ridged_3d(x, y, z, config),
        }
    }

    /// Samples every point with the same config, in order.
    #[must_use]
    pub fn batch_noise_3d(&self, points: &[Vec3], config: &NoiseConfig) -> Vec<f64> {
        points
            .iter()
            .map(|p| self.noise_3d(p.x, p.y, p.z, config))
            .collect()
    }

    /// Displaces a point by noise sampled at per-axis offsets.
    #[must_use]
    pub fn domain_warp_3d(
        &self,
        x: f64,
        y: f64,
        z: f64,
        strength: f64,
        config: &NoiseConfig,
    ) -> Vec3 {
        let wx = self.noise_3d(x + WARP_OFFSET, y, z, config) * strength;
        let wy = self.noise_3d(x, y + WARP_OFFSET, z, config) * strength;
        let wz = self.noise_3d(x, y, z + WARP_OFFSET, config) * strength;
        Vec3::new(x + wx, y + wy, z + wz)
    }

    /// Drops every cached sample.
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
        tracing::debug!("noise cache cleared");
    }

    /// Current cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> NoiseCacheStats {
        self.cache.lock().stats()
    }
}

/// [`NoiseEngine::perlin_3d`] on the default engine.
#[must_use]
pub fn perlin_3d(x: f64, y: f64, z: f64, config: &NoiseConfig) -> f64 {
    NoiseEngine::global().perlin_3d(x, y, z, config)
}

/// [`NoiseEngine::simplex_3d`] on the default engine.
#[must_use]
pub fn simplex_3d(x: f64, y: f64, z: f64, config: &NoiseConfig) -> f64 {
    NoiseEngine::global().simplex_3d(x, y, z, config)
}

/// [`NoiseEngine::worley_3d`] on the default engine.
#[must_use]
pub fn worley_3d(x: f64, y: f64, z: f64, config: &NoiseConfig) -> f64 {
    NoiseEngine::global().worley_3d(x, y, z, config)
}

/// [`NoiseEngine::fractal_3d`] on the default engine.
#[must_use]
pub fn fractal_3d(x: f64, y: f64, z: f64, config: &NoiseConfig) -> f64 {
    NoiseEngine::global().fractal_3d(x, y, z, config)
}

/// [`NoiseEngine::ridged_3d`] on the default engine.
#[must_use]
pub fn ridged_3d(x: f64, y: f64, z: f64, config: &NoiseConfig) -> f64 {
    NoiseEngine::global().ridged_3d(x, y, z, config)
}

/// [`NoiseEngine::noise_3d`] on the default engine.
#[must_use]
pub fn noise_3d(x: f64, y: f64, z: f64, config: &NoiseConfig) -> f64 {
    NoiseEngine::global().noise_3d(x, y, z, config)
}

/// [`NoiseEngine::batch_noise_3d`] on the default engine.
#[must_use]
pub fn batch_noise_3d(points: &[Vec3], config: &NoiseConfig) -> Vec<f64> {
    NoiseEngine::global().batch_noise_3d(points, config)
}

/// [`NoiseEngine::domain_warp_3d`] on the default engine.
#[must_use]
pub fn domain_warp_3d(x: f64, y: f64, z: f64, strength: f64, config: &NoiseConfig) -> Vec3 {
    NoiseEngine::global().domain_warp_3d(x, y, z, strength, config)
}

/// Clears the default engine's cache.
pub fn clear_noise_cache() {
    NoiseEngine::global().clear_cache();
}

/// Counters of the default engine's cache.
#[must_use]
pub fn noise_cache_stats() -> NoiseCacheStats {
    NoiseEngine::global().cache_stats()
}
