//! Bounded random helpers shared by the generators.

use glam::Vec2;
use rand::Rng;

pub const TWO_PI: f32 = std::f32::consts::TAU;

/// Uniform integer in `[min, max]`
pub fn random_int_inclusive<R: Rng + ?Sized>(rng: &mut R, min: u32, max: u32) -> u32 {
    if min >= max {
        return min;
    }
    rng.gen_range(min..=max)
}

/// Uniform float in `[0, 1)`
pub fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen::<f32>()
}

/// Uniform float in `[lo, hi)`
///
/// Returns `lo` when `lo == hi`. A reversed range yields values in `(hi, lo]`.
pub fn random_range<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    lo + random_unit(rng) * (hi - lo)
}

/// Uniform angle in `[0, 2π)`
pub fn random_angle<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    random_unit(rng) * TWO_PI
}

/// Uniform point in the square `[-half, half]²`
pub fn random_point_in_square<R: Rng + ?Sized>(rng: &mut R, half: f32) -> Vec2 {
    Vec2::new(random_range(rng, -half, half), random_range(rng, -half, half))
}
