//! Density-weighted sampling over the bins of a heatmap.
//!
//! A [`CumulativeDistribution`] is built over the non-zero bins. Each draw inverts it with a
//! uniform variate (binary search), then places the point uniformly inside the chosen bin.
use glam::DVec2;
use rand::RngCore;

use crate::sampling::{next_down, rand01, PositionSampling};
use crate::surface::Heatmap;

/// Running totals over the positive bins of a heatmap.
#[derive(Debug, Clone)]
pub struct CumulativeDistribution {
    cells: Vec<usize>,
    cumulative: Vec<f64>,
}

impl CumulativeDistribution {
    /// Returns `None` when the heatmap has no positive mass.
    pub fn from_heatmap(heatmap: &Heatmap) -> Option<Self> {
        let mut cells = Vec::new();
        let mut cumulative = Vec::new();
        let mut total = 0.0;
        for (i, v) in heatmap.data.iter().enumerate() {
            if v.is_finite() && *v > 0.0 {
                total += v;
                cells.push(i);
                cumulative.push(total);
            }
        }
        (total > 0.0).then_some(Self { cells, cumulative })
    }

    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Number of bins with positive mass.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Maps `u` in [0, 1) to a row-major bin index.
    pub fn pick(&self, u: f64) -> usize {
        let target = u * self.total();
        let slot = self.cumulative.partition_point(|c| *c <= target);
        self.cells[slot.min(self.cells.len() - 1)]
    }
}

/// Draws positions proportionally to heatmap mass, clamped to `clamp_min`..`clamp_max`.
#[derive(Debug, Clone)]
pub struct WeightedCellSampling<'a> {
    heatmap: &'a Heatmap,
    distribution: CumulativeDistribution,
    clamp_min: DVec2,
    clamp_max: DVec2,
}

impl<'a> WeightedCellSampling<'a> {
    /// Returns `None` when the heatmap has no positive mass.
    pub fn new(heatmap: &'a Heatmap) -> Option<Self> {
        let (clamp_min, clamp_max) = heatmap.grid.bounds();
        Some(Self {
            heatmap,
            distribution: CumulativeDistribution::from_heatmap(heatmap)?,
            clamp_min,
            clamp_max,
        })
    }

    /// Restricts positions to a box, usually the region's bounding box.
    pub fn with_bounds(mut self, min: DVec2, max: DVec2) -> Self {
        self.clamp_min = min;
        self.clamp_max = max;
        self
    }

    pub fn distribution(&self) -> &CumulativeDistribution {
        &self.distribution
    }

    fn sample_one(&self, rng: &mut dyn RngCore) -> DVec2 {
        let grid = &self.heatmap.grid;
        let cell = self.distribution.pick(rand01(rng));
        let (ix, iy) = ((cell % grid.width) as isize, (cell / grid.width) as isize);
        let (min, _) = grid.cell_bounds(ix, iy);
        let p = min + DVec2::new(rand01(rng), rand01(rng)) * grid.bin_size;
        DVec2::new(
            p.x.clamp(self.clamp_min.x, next_down(self.clamp_max.x).max(self.clamp_min.x)),
            p.y.clamp(self.clamp_min.y, next_down(self.clamp_max.y).max(self.clamp_min.y)),
        )
    }
}

impl PositionSampling for WeightedCellSampling<'_> {
    fn generate(&self, count: usize, rng: &mut dyn RngCore) -> Vec<DVec2> {
        (0..count).map(|_| self.sample_one(rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::surface::BinGrid;

    fn heatmap(data: Vec<f64>) -> Heatmap {
        let grid = BinGrid::covering(DVec2::ZERO, DVec2::new(60.0, 60.0), 30.0);
        Heatmap::from_data(grid, data).unwrap()
    }

    #[test]
    fn pick_inverts_the_cumulative_mass() {
        let map = heatmap(vec![0.7, 0.0, 0.0, 0.3]);
        let dist = CumulativeDistribution::from_heatmap(&map).unwrap();
        assert_eq!(dist.len(), 2);
        assert!((dist.total() - 1.0).abs() < 1e-12);
        assert_eq!(dist.pick(0.0), 0);
        assert_eq!(dist.pick(0.69), 0);
        assert_eq!(dist.pick(0.71), 3);
        assert_eq!(dist.pick(next_down(1.0)), 3);
    }

    #[test]
    fn zero_heatmap_has_no_distribution() {
        assert!(CumulativeDistribution::from_heatmap(&heatmap(vec![0.0; 4])).is_none());
        assert!(WeightedCellSampling::new(&heatmap(vec![0.0; 4])).is_none());
    }

    #[test]
    fn points_land_in_the_chosen_bin() {
        // Only the south-east bin (row 1, column 1) carries mass.
        let map = heatmap(vec![0.0, 0.0, 0.0, 1.0]);
        let sampler = WeightedCellSampling::new(&map).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let pts = sampler.generate(200, &mut rng);
        assert_eq!(pts.len(), 200);
        for p in pts {
            assert!(p.x >= 30.0 && p.x < 60.0, "{p:?}");
            assert!(p.y >= 0.0 && p.y < 30.0, "{p:?}");
        }
    }

    #[test]
    fn positions_are_clamped_to_bounds() {
        let map = heatmap(vec![1.0, 0.0, 0.0, 0.0]);
        let sampler = WeightedCellSampling::new(&map)
            .unwrap()
            .with_bounds(DVec2::new(10.0, 40.0), DVec2::new(20.0, 50.0));
        let mut rng = StdRng::seed_from_u64(9);
        for p in sampler.generate(50, &mut rng) {
            assert!(p.x >= 10.0 && p.x < 20.0);
            assert!(p.y >= 40.0 && p.y < 50.0);
        }
    }

    #[test]
    fn frequencies_follow_mass() {
        let map = heatmap(vec![0.1, 0.2, 0.3, 0.4]);
        let sampler = WeightedCellSampling::new(&map).unwrap();
        let mut rng = StdRng::seed_from_u64(2024);
        let mut counts = [0usize; 4];
        for p in sampler.generate(4_000, &mut rng) {
            let (ix, iy) = map.grid.world_to_index(p);
            counts[map.grid.index(ix, iy).unwrap()] += 1;
        }
        for (count, mass) in counts.iter().zip([0.1, 0.2, 0.3, 0.4]) {
            let freq = *count as f64 / 4_000.0;
            assert!((freq - mass).abs() < 0.03, "freq {freq} vs {mass}");
        }
    }
}
