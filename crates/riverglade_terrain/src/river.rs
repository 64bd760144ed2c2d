//! River synthesis: a jittered centerline across the tile, smoothed with a
//! Catmull-Rom spline, plus the bed/bank/edge curves derived from it.

use glam::Vec3;
use rand::Rng;
use serde::Serialize;

use crate::config::{RiverSettings, EDGE_PAD};
use crate::error::TerrainError;
use crate::random::{random_range, random_unit};

/// Interpolated points per waypoint segment
pub const SPLINE_POINTS_PER_SEGMENT: usize = 4;

/// x-extent of the river exclusion zone, constant along z
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiverBounds {
    pub left: f32,
    pub right: f32,
}

impl RiverBounds {
    /// Coarse test: strictly between the bounds
    pub fn contains_x(&self, x: f32) -> bool {
        x > self.left && x < self.right
    }
}

/// Curves co-indexed with the river path
#[derive(Debug, Clone, PartialEq)]
pub struct RiverGeometry {
    pub bed_left: Vec<Vec3>,
    pub bed_right: Vec<Vec3>,
    pub bank_left: Vec<Vec3>,
    pub bank_right: Vec<Vec3>,
    pub edge_left: Vec<Vec3>,
    pub edge_right: Vec<Vec3>,
}

impl RiverGeometry {
    /// Offset the centerline into bed, bank and edge curves
    pub fn derive(path: &[Vec3], settings: &RiverSettings, bounds: RiverBounds) -> Self {
        let half_width = settings.half_width();

        let bed_left: Vec<Vec3> = path
            .iter()
            .map(|p| Vec3::new(p.x - half_width, -settings.depth, p.z))
            .collect();
        let bed_right: Vec<Vec3> = path
            .iter()
            .map(|p| Vec3::new(p.x + half_width, -settings.depth, p.z))
            .collect();

        let bank_left: Vec<Vec3> = bed_left
            .iter()
            .map(|p| Vec3::new(p.x - settings.edges_width, 0.0, p.z))
            .collect();
        let bank_right: Vec<Vec3> = bed_right
            .iter()
            .map(|p| Vec3::new(p.x + settings.edges_width, 0.0, p.z))
            .collect();

        let edge_left = bank_left.iter().map(|p| Vec3::new(bounds.left, 0.0, p.z)).collect();
        let edge_right = bank_right.iter().map(|p| Vec3::new(bounds.right, 0.0, p.z)).collect();

        Self {
            bed_left,
            bed_right,
            bank_left,
            bank_right,
            edge_left,
            edge_right,
        }
    }
}

/// A generated river: centerline, exclusion bounds and derived curves
#[derive(Debug, Clone, PartialEq)]
pub struct River {
    pub path: Vec<Vec3>,
    pub bounds: RiverBounds,
    pub geometry: RiverGeometry,
    /// Distance from the centerline to the outer edge of a bank
    reach: f32,
}

impl River {
    pub fn new(path: Vec<Vec3>, bounds: RiverBounds, settings: &RiverSettings) -> Self {
        let geometry = RiverGeometry::derive(&path, settings, bounds);
        Self {
            path,
            bounds,
            geometry,
            reach: settings.half_width() + settings.edges_width,
        }
    }

    /// Local exclusion x-range around the river at depth `z`
    ///
    /// Brackets `z` between the first path point at or past it and its
    /// predecessor. `None` when the path ends before `z`.
    pub fn exclusion_range_at(&self, z: f32) -> Option<(f32, f32)> {
        let top = self.path.iter().position(|p| z <= p.z)?;
        let bottom = top.saturating_sub(1);

        let (a, b) = (self.path[top].x, self.path[bottom].x);
        Some((a.min(b) - self.reach, a.max(b) + self.reach))
    }

    /// True when a tree at `(x, z)` would stand in the water or on a bank
    pub fn excludes(&self, x: f32, z: f32) -> bool {
        if !self.bounds.contains_x(x) {
            return false;
        }
        match self.exclusion_range_at(z) {
            Some((left, right)) => x > left && x < right,
            None => false,
        }
    }
}

/// Generate a river crossing the tile along z
pub fn generate_river<R: Rng + ?Sized>(
    rng: &mut R,
    tile_size: f32,
    settings: &RiverSettings,
) -> Result<River, TerrainError> {
    settings.validate(tile_size)?;

    let half = tile_size / 2.0;
    let total_margin = settings.total_margin();
    let center = random_range(rng, -half + total_margin, half - total_margin);
    let corridor_left = center - settings.corridor_width / 2.0;
    let corridor_right = corridor_left + settings.corridor_width;

    let waypoints: Vec<Vec3> = waypoint_depths(half, settings.step)
        .into_iter()
        .map(|z| Vec3::new(corridor_left + random_unit(rng) * settings.corridor_width, 0.0, z))
        .collect();

    // A short last segment can bend z past the border
    let path: Vec<Vec3> = catmull_rom(&waypoints, SPLINE_POINTS_PER_SEGMENT)
        .into_iter()
        .map(|p| Vec3::new(p.x, 0.0, p.z.clamp(-half, half)))
        .collect();

    let reach = settings.half_width() + settings.edges_width + EDGE_PAD;
    let bounds = RiverBounds {
        left: corridor_left - reach,
        right: corridor_right + reach,
    };

    log::info!(
        "River has {} points ({} waypoints), exclusion [{:.2}, {:.2}]",
        path.len(),
        waypoints.len(),
        bounds.left,
        bounds.right
    );

    Ok(River::new(path, bounds, settings))
}

/// Waypoint z values from `-half` to `+half`, `step` apart
///
/// When `step` does not divide the tile the last segment is shorter; `+half`
/// is always the final value.
pub fn waypoint_depths(half: f32, step: f32) -> Vec<f32> {
    const EPS: f32 = 1e-4;
    let tile_size = half * 2.0;
    let steps = ((tile_size + EPS) / step).floor() as usize;

    let mut depths: Vec<f32> = (0..=steps)
        .map(|i| (-half + i as f32 * step).min(half))
        .collect();

    match depths.last_mut() {
        Some(last) if *last >= half - EPS => *last = half,
        _ => depths.push(half),
    }
    depths
}

/// Uniform Catmull-Rom through `points`, `per_segment` samples per segment
///
/// End points are duplicated as phantom control points, so the curve starts
/// at the first point and ends exactly on the last one. Produces
/// `(n - 1) * per_segment + 1` samples.
pub fn catmull_rom(points: &[Vec3], per_segment: usize) -> Vec<Vec3> {
    if points.len() < 2 || per_segment == 0 {
        return points.to_vec();
    }

    let mut control = Vec::with_capacity(points.len() + 2);
    control.push(points[0]);
    control.extend_from_slice(points);
    control.push(points[points.len() - 1]);

    let amount = 1.0 / per_segment as f32;
    let mut samples = Vec::with_capacity((points.len() - 1) * per_segment + 1);

    for window in control.windows(4) {
        for c in 0..per_segment {
            samples.push(catmull_rom_point(window[0], window[1], window[2], window[3], c as f32 * amount));
        }
    }
    samples.push(points[points.len() - 1]);

    samples
}

fn catmull_rom_point(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;

    0.5 * ((2.0 * p1)
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}
