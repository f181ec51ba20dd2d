//! Uniform random position sampling inside a region.
use glam::DVec2;
use rand::RngCore;

use crate::geometry::Region;
use crate::sampling::{next_down, rand01, PositionSampling};

/// Rejection attempts per point before falling back to the bounding box.
pub const DEFAULT_MAX_ATTEMPTS: usize = 1_000;

/// Uniform i.i.d. random sampling over a region.
///
/// Polygons are sampled by rejection inside their bounding box; circles by polar sampling
/// with a square-root radius so density stays uniform over the disc.
#[derive(Debug, Clone)]
pub struct UniformRegionSampling<'a> {
    region: &'a Region,
    /// Rejection attempts per point before accepting a bounding-box point.
    pub max_attempts: usize,
}

impl<'a> UniformRegionSampling<'a> {
    pub fn new(region: &'a Region) -> Self {
        Self {
            region,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    fn bbox_point(&self, rng: &mut dyn RngCore) -> DVec2 {
        let (min, max) = self.region.bounds();
        let size = max - min;
        let u = rand01(rng);
        let v = rand01(rng);
        // Keep strictly inside right/top edges.
        DVec2::new(
            (min.x + u * size.x).clamp(min.x, next_down(max.x).max(min.x)),
            (min.y + v * size.y).clamp(min.y, next_down(max.y).max(min.y)),
        )
    }

    fn sample_one(&self, rng: &mut dyn RngCore) -> DVec2 {
        if self.region.local_polygon().is_none() {
            let (min, max) = self.region.bounds();
            let radius = (max.x - min.x) * 0.5;
            let r = radius * rand01(rng).sqrt();
            let theta = std::f64::consts::TAU * rand01(rng);
            return DVec2::new(r * theta.cos(), r * theta.sin());
        }

        for _ in 0..self.max_attempts {
            let p = self.bbox_point(rng);
            if self.region.contains_local(p) {
                return p;
            }
        }
        self.bbox_point(rng)
    }
}

impl PositionSampling for UniformRegionSampling<'_> {
    fn generate(&self, count: usize, rng: &mut dyn RngCore) -> Vec<DVec2> {
        (0..count).map(|_| self.sample_one(rng)).collect()
    }
}
