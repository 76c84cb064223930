//! # Simplex Noise
//!
//! 3D simplex noise over the shared permutation table.
//!
//! ## Why Simplex over Perlin?
//!
//! - Fewer directional artifacts
//! - Four corner contributions instead of eight
//! - No lattice-point zeros

use super::perlin::perm;

/// Skewing factor for the 3D simplex grid.
const F3: f64 = 1.0 / 3.0;
/// Unskewing factor for the 3D simplex grid.
const G3: f64 = 1.0 / 6.0;

/// Twelve gradient vectors pointing to the edges of a cube.
const GRAD3: [[i8; 3]; 12] = [
    [1, 1, 0], [-1, 1, 0], [1, -1, 0], [-1, -1, 0],
    [1, 0, 1], [-1, 0, 1], [1, 0, -1], [-1, 0, -1],
    [0, 1, 1], [0, -1, 1], [0, 1, -1], [0, -1, -1],
];

/// Calculates the contribution from one corner of the simplex.
#[inline]
fn contribution(x: f64, y: f64, z: f64, gradient_index: usize) -> f64 {
    let t = 0.6 - x * x - y * y - z * z;
    if t < 0.0 {
        0.0
    } else {
        let g = GRAD3[gradient_index % 12];
        let t2 = t * t;
        t2 * t2 * (f64::from(g[0]) * x + f64::from(g[1]) * y + f64::from(g[2]) * z)
    }
}

/// Samples 3D simplex noise at already-scaled coordinates.
///
/// # Returns
///
/// A value roughly in the range [-1, 1].
#[must_use]
pub fn sample(x: f64, y: f64, z: f64) -> f64 {
    // Skew input space to find the simplex cell
    let s = (x + y + z) * F3;
    let i = (x + s).floor();
    let j = (y + s).floor();
    let k = (z + s).floor();

    // Unskew the cell origin back to (x, y, z) space
    let t = (i + j + k) * G3;
    let x0 = x - (i - t);
    let y0 = y - (j - t);
    let z0 = z - (k - t);

    // Determine which of the six tetrahedra we are in
    let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
        if y0 >= z0 {
            (1, 0, 0, 1, 1, 0)
        } else if x0 >= z0 {
            (1, 0, 0, 1, 0, 1)
        } else {
            (0, 0, 1, 1, 0, 1)
        }
    } else if y0 < z0 {
        (0, 0, 1, 0, 1, 1)
    } else if x0 < z0 {
        (0, 1, 0, 0, 1, 1)
    } else {
        (0, 1, 0, 1, 1, 0)
    };

    let x1 = x0 - f64::from(i1) + G3;
    let y1 = y0 - f64::from(j1) + G3;
    let z1 = z0 - f64::from(k1) + G3;
    let x2 = x0 - f64::from(i2) + 2.0 * G3;
    let y2 = y0 - f64::from(j2) + 2.0 * G3;
    let z2 = z0 - f64::from(k2) + 2.0 * G3;
    let x3 = x0 - 1.0 + 3.0 * G3;
    let y3 = y0 - 1.0 + 3.0 * G3;
    let z3 = z0 - 1.0 + 3.0 * G3;

    // Hashed gradient indices of the four corners
    let ii = ((i as i64) & 255) as usize;
    let jj = ((j as i64) & 255) as usize;
    let kk = ((k as i64) & 255) as usize;
    let (i1, j1, k1) = (i1 as usize, j1 as usize, k1 as usize);
    let (i2, j2, k2) = (i2 as usize, j2 as usize, k2 as usize);

    let gi0 = perm(ii + perm(jj + perm(kk)));
    let gi1 = perm(ii + i1 + perm(jj + j1 + perm(kk + k1)));
    let gi2 = perm(ii + i2 + perm(jj + j2 + perm(kk + k2)));
    let gi3 = perm(ii + 1 + perm(jj + 1 + perm(kk + 1)));

    let n0 = contribution(x0, y0, z0, gi0);
    let n1 = contribution(x1, y1, z1, gi1);
    let n2 = contribution(x2, y2, z2, gi2);
    let n3 = contribution(x3, y3, z3, gi3);

    // Scale to roughly [-1, 1]
    32.0 * (n0 + n1 + n2 + n3)
}
