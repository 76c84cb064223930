//! # Hash Noise Utilities
//!
//! Scalar helpers used by compute functions: uniform values hashed from a
//! seed and a label, spatial noise sampled at hash-derived coordinates,
//! and small mapping functions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::noise::{NoiseAlgorithm, NoiseConfig, NoiseEngine};
use crate::seed::{fnv1a_64, PATH_SEPARATOR};

/// Divisor mapping a 32-bit hash into [0, 1].
const U32_MAX: f64 = 4_294_967_295.0;

/// Extent of the hash-derived sample coordinates.
const COORDINATE_SPAN: f64 = 100.0;

/// Low 32 bits of the hash of `seed::label`.
#[inline]
fn label_hash(seed: &str, label: &str) -> u32 {
    (fnv1a_64(&format!("{seed}{PATH_SEPARATOR}{label}")) & 0xffff_ffff) as u32
}

/// Uniform value in [0, 1] for a seed and label.
///
/// The same pair always gives the same value. Different labels under one
/// seed are independent streams.
#[must_use]
pub fn noise01(seed: &str, label: &str) -> f64 {
    f64::from(label_hash(seed, label)) / U32_MAX
}

/// [`noise01`] for several labels under one seed, in order.
#[must_use]
pub fn batch_noise01<S: AsRef<str>>(seed: &str, labels: &[S]) -> Vec<f64> {
    labels.iter().map(|l| noise01(seed, l.as_ref())).collect()
}

/// Where a sampled value comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseSource {
    /// Plain seed/label hash.
    #[default]
    Hash,
    /// Perlin at hash-derived coordinates.
    Perlin,
    /// Simplex at hash-derived coordinates.
    Simplex,
    /// Worley at hash-derived coordinates.
    Worley,
    /// Fractal at hash-derived coordinates.
    Fractal,
    /// Ridged at hash-derived coordinates.
    Ridged,
}

impl NoiseSource {
    /// Spatial algorithm behind this source, `None` for [`NoiseSource::Hash`].
    #[must_use]
    pub const fn algorithm(self) -> Option<NoiseAlgorithm> {
        match self {
            Self::Hash => None,
            Self::Perlin => Some(NoiseAlgorithm::Perlin),
            Self::Simplex => Some(NoiseAlgorithm::Simplex),
            Self::Worley => Some(NoiseAlgorithm::Worley),
            Self::Fractal => Some(NoiseAlgorithm::Fractal),
            Self::Ridged => Some(NoiseAlgorithm::Ridged),
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self.algorithm() {
            None => "hash",
            Some(algorithm) => algorithm.name(),
        }
    }
}

impl fmt::Display for NoiseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NoiseSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "hash" {
            return Ok(Self::Hash);
        }
        match s.parse::<NoiseAlgorithm>()? {
            NoiseAlgorithm::Perlin => Ok(Self::Perlin),
            NoiseAlgorithm::Simplex => Ok(Self::Simplex),
            NoiseAlgorithm::Worley => Ok(Self::Worley),
            NoiseAlgorithm::Fractal => Ok(Self::Fractal),
            NoiseAlgorithm::Ridged => Ok(Self::Ridged),
        }
    }
}

/// Value in [0, 1] for a seed and label, drawn from `source`.
///
/// Spatial sources sample the default [`NoiseEngine`] at a point whose
/// coordinates are the low three bytes of the label hash, each scaled into
/// `[0, 100]`, then normalize the kernel output into [0, 1].
#[must_use]
pub fn advanced_noise01(seed: &str, label: &str, source: NoiseSource) -> f64 {
    advanced_noise01_with(NoiseEngine::global(), seed, label, source)
}

/// [`advanced_noise01`] on an explicit engine.
#[must_use]
pub fn advanced_noise01_with(engine: &NoiseEngine, seed: &str, label: &str, source: NoiseSource) -> f64 {
    let Some(algorithm) = source.algorithm() else {
        return noise01(seed, label);
    };

    let hash = label_hash(seed, label);
    let axis = |shift: u32| f64::from((hash >> shift) & 0xff) / 255.0 * COORDINATE_SPAN;
    let (x, y, z) = (axis(0), axis(8), axis(16));

    let config = NoiseConfig::new(algorithm).with_seed(seed);
    let raw = engine.noise_3d(x, y, z, &config);
    algorithm.normalize01(raw, &config)
}

/// Linear map of `value` in [0, 1] onto `[min, max]`.
#[inline]
#[must_use]
pub fn map_range01(value: f64, min: f64, max: f64) -> f64 {
    min + (max - min) * value
}

/// `base^value`, optionally mapped linearly onto `range`.
#[must_use]
pub fn map_exp(value: f64, base: f64, range: Option<(f64, f64)>) -> f64 {
    let result = base.powf(value);
    match range {
        Some((min, max)) => min + (max - min) * result,
        None => result,
    }
}

/// Picks the first entry whose threshold is above `value`.
///
/// Falls back to the last entry; `None` only for an empty list.
#[must_use]
pub fn resolve_discrete<T>(value: f64, thresholds: &[(f64, T)]) -> Option<&T> {
    thresholds
        .iter()
        .find(|(threshold, _)| value < *threshold)
        .or_else(|| thresholds.last())
        .map(|(_, v)| v)
}
