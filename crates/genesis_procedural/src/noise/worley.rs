//! # Worley Noise
//!
//! Cellular noise: distance from the sample point to the nearest feature
//! point. Each unit cell owns one feature point whose offset is hashed
//! from the cell coordinates, so the field is fixed for all time.

/// Largest possible nearest-feature distance (cube diagonal).
pub const MAX_DISTANCE: f64 = 1.732_050_807_568_877_2;

/// Feature point offset of a cell, each axis in [0, 1).
///
/// Cell coordinates hash by their low 32 bits.
#[inline]
#[allow(clippy::cast_possible_truncation)]
fn feature_offset(cx: i64, cy: i64, cz: i64) -> (f64, f64, f64) {
    let (cx, cy, cz) = (cx as i32, cy as i32, cz as i32);
    let hash = (cx.wrapping_mul(73_856_093) ^ cy.wrapping_mul(19_349_663) ^ cz.wrapping_mul(83_492_791))
        & 0x7fff_ffff;
    (
        f64::from(hash % 1000) / 1000.0,
        f64::from((hash >> 10) % 1000) / 1000.0,
        f64::from((hash >> 20) % 1000) / 1000.0,
    )
}

/// Samples 3D Worley noise at already-scaled coordinates.
///
/// Searches the 3x3x3 block of cells around the sample point.
///
/// # Returns
///
/// The nearest feature distance, in `[0, MAX_DISTANCE]`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn sample(x: f64, y: f64, z: f64) -> f64 {
    let xi = x.floor() as i64;
    let yi = y.floor() as i64;
    let zi = z.floor() as i64;

    let mut min_dist = f64::INFINITY;

    for dx in -1..=1 {
        for dy in -1..=1 {
            for dz in -1..=1 {
                let cx = xi.wrapping_add(dx);
                let cy = yi.wrapping_add(dy);
                let cz = zi.wrapping_add(dz);

                let (ox, oy, oz) = feature_offset(cx, cy, cz);
                let px = cx as f64 + ox;
                let py = cy as f64 + oy;
                let pz = cz as f64 + oz;

                let ddx = x - px;
                let ddy = y - py;
                let ddz = z - pz;
                let dist = (ddx * ddx + ddy * ddy + ddz * ddz).sqrt();

                min_dist = min_dist.min(dist);
            }
        }
    }

    min_dist
}
