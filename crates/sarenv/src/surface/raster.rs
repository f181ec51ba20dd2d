//! Raster storage for probability surfaces.
//!
//! Stores one value per bin of a [`BinGrid`], row-major with row 0 at the north edge.
use glam::DVec2;

use super::grid::BinGrid;
use crate::error::{Error, Result};

/// Tolerance used when checking that a surface sums to one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// A grid of non-negative values with the bin grid it was rasterized on.
#[derive(Clone, Debug, PartialEq)]
pub struct Heatmap {
    pub grid: BinGrid,
    pub data: Vec<f64>,
}

impl Heatmap {
    /// Create a new heatmap over the given grid, initializing all values to zero.
    pub fn new(grid: BinGrid) -> Self {
        let len = grid.len();
        Self {
            grid,
            data: vec![0.0; len],
        }
    }

    /// Wraps existing row-major data. Fails if the length does not match the grid.
    pub fn from_data(grid: BinGrid, data: Vec<f64>) -> Result<Self> {
        if data.len() != grid.len() {
            return Err(Error::InvalidInput(format!(
                "heatmap data has {} values but the grid has {} bins",
                data.len(),
                grid.len()
            )));
        }
        Ok(Self { grid, data })
    }

    /// Get the size of the heatmap as `(width, height)`.
    pub fn size(&self) -> (usize, usize) {
        (self.grid.width, self.grid.height)
    }

    /// Array shape as `(rows, columns)`, the order used by exported rasters.
    pub fn shape(&self) -> (usize, usize) {
        (self.grid.height, self.grid.width)
    }

    /// Get the value at the given bin indices, returning `0.0` if out of bounds.
    pub fn get(&self, ix: isize, iy: isize) -> f64 {
        self.grid.index(ix, iy).map_or(0.0, |i| self.data[i])
    }

    /// Sample the heatmap at a local position, using the bin that contains it.
    pub fn sample_local(&self, p: DVec2) -> f64 {
        let (ix, iy) = self.grid.world_to_index(p);
        self.get(ix, iy)
    }

    /// Iterates over rows from north to south.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks(self.grid.width.max(1))
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(0.0, f64::max)
    }

    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Returns `true` if every value is zero.
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|v| *v == 0.0)
    }

    /// Returns `true` if the values sum to one within [`PROBABILITY_TOLERANCE`].
    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= PROBABILITY_TOLERANCE
    }

    /// Divides every bin by the total so the heatmap sums to one.
    pub fn normalize(&mut self) -> Result<()> {
        let total = self.sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(Error::EmptySurface);
        }
        for v in &mut self.data {
            *v /= total;
        }
        Ok(())
    }

    /// Adds `weight * other` into this heatmap. Both must share the same grid.
    pub fn add_scaled(&mut self, other: &Heatmap, weight: f64) {
        debug_assert_eq!(self.grid, other.grid, "heatmaps must share a grid");
        for (dst, src) in self.data.iter_mut().zip(&other.data) {
            *dst += weight * src;
        }
    }
}
