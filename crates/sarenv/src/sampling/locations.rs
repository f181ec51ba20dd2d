//! Synthetic lost-person locations drawn from an environment.
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::debug;

use crate::environment::Environment;
use crate::geometry::LonLat;
use crate::sampling::{PositionSampling, UniformRegionSampling, WeightedCellSampling};

/// Seed used by [`LostPersonLocationGenerator::new`].
pub const DEFAULT_SEED: u64 = 0x5A4E_4C4F_4341_5445;

/// Splits `count` into `(weighted, random)` draws.
///
/// The weighted share is floored; the remainder goes to random draws. `random_fraction` is
/// clamped to [0, 1] and NaN counts as fully random.
pub fn split_counts(count: usize, random_fraction: f64) -> (usize, usize) {
    let fraction = if random_fraction.is_nan() {
        1.0
    } else {
        random_fraction.clamp(0.0, 1.0)
    };
    let exact = (count as f64) * (1.0 - fraction);
    // `1.0 - 0.8` is 0.19999999999999996; absorb that noise before flooring.
    let weighted = (exact + exact * 1e-9 + 1e-9).floor() as usize;
    let weighted = weighted.min(count);
    (weighted, count - weighted)
}

/// Draws lon/lat locations from an [`Environment`], mixing density-weighted and uniform
/// draws.
///
/// The generator owns its RNG, so consecutive calls continue the same stream. Two generators
/// with the same seed over the same environment produce identical output.
#[derive(Debug, Clone)]
pub struct LostPersonLocationGenerator<'a> {
    environment: &'a Environment,
    rng: StdRng,
}

impl<'a> LostPersonLocationGenerator<'a> {
    pub fn new(environment: &'a Environment) -> Self {
        Self::with_seed(environment, DEFAULT_SEED)
    }

    pub fn with_seed(environment: &'a Environment, seed: u64) -> Self {
        Self {
            environment,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn environment(&self) -> &Environment {
        self.environment
    }

    /// Returns exactly `count` locations: the weighted draws first, then the random ones.
    ///
    /// Without a combined surface every draw is uniform over the region.
    pub fn generate_locations(&mut self, count: usize, random_fraction: f64) -> Vec<LonLat> {
        generate_locations_with_rng(self.environment, count, random_fraction, &mut self.rng)
    }
}

/// [`LostPersonLocationGenerator::generate_locations`] with a caller-supplied RNG.
pub fn generate_locations_with_rng(
    environment: &Environment,
    count: usize,
    random_fraction: f64,
    rng: &mut dyn RngCore,
) -> Vec<LonLat> {
    if count == 0 {
        return Vec::new();
    }
    let region = environment.region();
    let uniform = UniformRegionSampling::new(region);
    let (weighted, random) = split_counts(count, random_fraction);

    let mut local = Vec::with_capacity(count);
    match environment.combined_heatmap().and_then(WeightedCellSampling::new) {
        Some(sampler) => {
            let (min, max) = region.bounds();
            local.extend(sampler.with_bounds(min, max).generate(weighted, rng));
            local.extend(uniform.generate(random, rng));
        }
        None => {
            if weighted > 0 {
                debug!("No combined surface; drawing all {} locations uniformly.", count);
            }
            local.extend(uniform.generate(count, rng));
        }
    }

    let frame = region.frame();
    local.into_iter().map(|p| frame.unproject(p)).collect()
}
