//! # Fractal Noise
//!
//! Octave sums over a base kernel.
//!
//! ## Octaves
//!
//! Each octave samples the base kernel at `frequency * lacunarity^i` with
//! weight `persistence^i`. Fractal (fBm) output is divided by the total
//! weight so it keeps the base kernel's range; ridged output is not
//! normalized.

use super::{perlin, simplex, worley, NoiseAlgorithm, NoiseConfig};

/// Samples the base kernel of a fractal sum at one frequency.
#[inline]
fn sample_base(base: NoiseAlgorithm, x: f64, y: f64, z: f64, frequency: f64) -> f64 {
    let (x, y, z) = (x * frequency, y * frequency, z * frequency);
    match base {
        NoiseAlgorithm::Simplex => simplex::sample(x, y, z),
        NoiseAlgorithm::Worley => worley::sample(x, y, z),
        NoiseAlgorithm::Perlin | NoiseAlgorithm::Fractal | NoiseAlgorithm::Ridged => {
            perlin::sample(x, y, z)
        }
    }
}

/// Fractal Brownian motion.
///
/// The base kernel is Perlin when the selector is `fractal`, otherwise the
/// selected kernel.
#[must_use]
pub fn fbm(x: f64, y: f64, z: f64, config: &NoiseConfig) -> f64 {
    let base = config.algorithm.fractal_base();
    let mut value = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = config.frequency;
    let mut max_value = 0.0;

    for _ in 0..config.octaves.max(1) {
        value += sample_base(base, x, y, z, frequency) * amplitude;
        max_value += amplitude;
        amplitude *= config.persistence;
        frequency *= config.lacunarity;
    }

    value / max_value
}

/// Ridged multifractal over Perlin.
///
/// Each octave is folded through `(1 - |v|)^2` and weighted by the previous
/// octave, which sharpens crests into ridges.
#[must_use]
pub fn ridged(x: f64, y: f64, z: f64, config: &NoiseConfig) -> f64 {
    let mut value = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = config.frequency;
    let mut weight = 1.0;

    for _ in 0..config.octaves.max(1) {
        let mut octave = 1.0 - perlin::sample(x * frequency, y * frequency, z * frequency).abs();
        octave *= octave;
        octave *= weight;

        weight = (octave * 2.0).clamp(0.0, 1.0);

        value += octave * amplitude;
        amplitude *= config.persistence;
        frequency *= config.lacunarity;
    }

    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(algorithm: NoiseAlgorithm, octaves: u32) -> NoiseConfig {
        NoiseConfig {
            algorithm,
            octaves,
            ..NoiseConfig::default()
        }
    }

    #[test]
    fn test_single_octave_equals_base() {
        let c = config(NoiseAlgorithm::Fractal, 1);
        let (x, y, z) = (3.3, 1.7, 8.2);
        assert!((fbm(x, y, z, &c) - perlin::sample(x, y, z)).abs() < 1e-12);
    }

    #[test]
    fn test_simplex_base() {
        let c = config(NoiseAlgorithm::Simplex, 1);
        let (x, y, z) = (0.4, 0.9, 2.6);
        assert!((fbm(x, y, z, &c) - simplex::sample(x, y, z)).abs() < 1e-12);
    }

    #[test]
    fn test_ridged_non_negative() {
        let c = config(NoiseAlgorithm::Ridged, 6);
        for i in 0..2_000 {
            let t = f64::from(i) * 0.21;
            let v = ridged(t, -t * 0.5, t * 0.3, &c);
            assert!(v >= 0.0, "Ridged output should be non-negative, got {v}");
            assert!(v <= c.total_amplitude() + 1e-9);
        }
    }

    #[test]
    fn test_zero_octaves_runs_once() {
        let c = config(NoiseAlgorithm::Fractal, 0);
        let v = fbm(1.5, 2.5, 3.5, &c);
        assert!((v - perlin::sample(1.5, 2.5, 3.5)).abs() < 1e-12);
    }
}
