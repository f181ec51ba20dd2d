//! Position sampling inside a region.
//!
//! Samplers work in the region's local meter frame and return [`DVec2`] positions. The
//! [`LostPersonLocationGenerator`] mixes density-weighted and uniform draws and converts the
//! result to lon/lat.
use glam::DVec2;
use rand::RngCore;

pub mod locations;
pub mod uniform;
pub mod weighted;

pub use locations::{
    generate_locations_with_rng, split_counts, LostPersonLocationGenerator, DEFAULT_SEED,
};
pub use uniform::UniformRegionSampling;
pub use weighted::{CumulativeDistribution, WeightedCellSampling};

/// Trait for position sampling.
pub trait PositionSampling: Send + Sync {
    /// Draws exactly `count` local positions.
    fn generate(&self, count: usize, rng: &mut dyn RngCore) -> Vec<DVec2>;
}

/// Generate a random float in the range [0, 1).
#[inline]
pub(crate) fn rand01(rng: &mut dyn RngCore) -> f64 {
    // 53 random mantissa bits.
    (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}

/// Compute the next smaller representable float value.
///
/// Used to keep positions strictly below an upper edge.
#[inline]
pub(crate) fn next_down(val: f64) -> f64 {
    if val.is_nan() {
        return f64::NAN;
    }

    if val == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }

    if val == f64::INFINITY {
        return f64::MAX;
    }

    if val == 0.0 {
        return -f64::MIN_POSITIVE;
    }

    let bits = val.to_bits();
    if val > 0.0 {
        f64::from_bits(bits.saturating_sub(1))
    } else {
        f64::from_bits(bits.saturating_add(1))
    }
}
