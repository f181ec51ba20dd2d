//! Bin grid utilities for probability surfaces.
//!
//! This module defines [`BinGrid`], the linear transform between bin indices and local
//! meter coordinates. Row 0 is the northern-most row so rasters read like images.
use glam::DVec2;

use crate::error::{Error, Result};

/// Defines a 2D grid of square bins over a region's bounding extent.
#[derive(Clone, Debug, PartialEq)]
pub struct BinGrid {
    /// Local-meter position of the north-west corner of bin `(0, 0)`.
    pub origin: DVec2,
    /// Bin edge length in meters.
    pub bin_size: f64,
    /// Number of bins along X (columns).
    pub width: usize,
    /// Number of bins along Y (rows).
    pub height: usize,
}

impl BinGrid {
    /// Builds the grid covering the box `min`..`max`. Dimensions depend only on the box size
    /// and `bin_size`; any overhang from rounding up is split evenly between both sides.
    pub fn covering(min: DVec2, max: DVec2, bin_size: f64) -> Self {
        debug_assert!(bin_size > 0.0, "bin_size must be > 0");
        let extent = (max - min).max(DVec2::ZERO);
        let width = bins_for(extent.x, bin_size);
        let height = bins_for(extent.y, bin_size);
        let center = (min + max) * 0.5;
        Self {
            origin: DVec2::new(
                center.x - width as f64 * bin_size * 0.5,
                center.y + height as f64 * bin_size * 0.5,
            ),
            bin_size,
            width,
            height,
        }
    }

    /// Like [`BinGrid::covering`], but refuses to describe more than `max_cells` bins.
    pub fn try_covering(min: DVec2, max: DVec2, bin_size: f64, max_cells: usize) -> Result<Self> {
        if !bin_size.is_finite() || bin_size <= 0.0 {
            return Err(Error::InvalidConfig("meter_per_bin must be > 0".into()));
        }
        let extent = (max - min).max(DVec2::ZERO);
        let cells = bin_count(extent.x, bin_size) * bin_count(extent.y, bin_size);
        if !cells.is_finite() || cells > max_cells as f64 {
            return Err(Error::InvalidConfig(format!(
                "grid of {cells} bins exceeds the limit of {max_cells}"
            )));
        }
        Ok(Self::covering(min, max, bin_size))
    }

    /// Total number of bins.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grid bounds as `(min, max)` in local meters.
    pub fn bounds(&self) -> (DVec2, DVec2) {
        let min = DVec2::new(self.origin.x, self.origin.y - self.height as f64 * self.bin_size);
        let max = DVec2::new(self.origin.x + self.width as f64 * self.bin_size, self.origin.y);
        (min, max)
    }

    /// Row-major linear index of `(ix, iy)`, or `None` when out of bounds.
    #[inline]
    pub fn index(&self, ix: isize, iy: isize) -> Option<usize> {
        if ix < 0 || iy < 0 || ix >= self.width as isize || iy >= self.height as isize {
            return None;
        }
        Some(iy as usize * self.width + ix as usize)
    }

    /// Converts a local position to `(column, row)` bin indices.
    pub fn world_to_index(&self, p: DVec2) -> (isize, isize) {
        let px = (p.x - self.origin.x) / self.bin_size;
        let py = (self.origin.y - p.y) / self.bin_size;
        (px.floor() as isize, py.floor() as isize)
    }

    /// Converts bin indices back to the local position of the bin center.
    pub fn index_to_world(&self, ix: isize, iy: isize) -> DVec2 {
        DVec2::new(
            self.origin.x + (ix as f64 + 0.5) * self.bin_size,
            self.origin.y - (iy as f64 + 0.5) * self.bin_size,
        )
    }

    /// The `(min, max)` corners of a bin's footprint.
    pub fn cell_bounds(&self, ix: isize, iy: isize) -> (DVec2, DVec2) {
        let min = DVec2::new(
            self.origin.x + ix as f64 * self.bin_size,
            self.origin.y - (iy as f64 + 1.0) * self.bin_size,
        );
        (min, min + DVec2::splat(self.bin_size))
    }

    /// Inclusive `(x0, x1, y0, y1)` index span of the bins overlapping `min`..`max`,
    /// clamped to the grid. `None` when the box misses the grid entirely.
    pub fn index_span(&self, min: DVec2, max: DVec2) -> Option<(usize, usize, usize, usize)> {
        if self.is_empty() {
            return None;
        }
        let (x0, y1) = self.world_to_index(DVec2::new(min.x, min.y));
        let (x1, y0) = self.world_to_index(DVec2::new(max.x, max.y));
        let (w, h) = (self.width as isize, self.height as isize);
        if x1 < 0 || y1 < 0 || x0 >= w || y0 >= h {
            return None;
        }
        Some((
            x0.clamp(0, w - 1) as usize,
            x1.clamp(0, w - 1) as usize,
            y0.clamp(0, h - 1) as usize,
            y1.clamp(0, h - 1) as usize,
        ))
    }
}

/// Bins needed along one axis, as a float so oversized extents can be rejected first.
fn bin_count(extent: f64, bin_size: f64) -> f64 {
    // Tolerate float noise so an exact multiple does not gain an extra bin.
    ((extent / bin_size) - 1e-9).ceil().max(1.0)
}

fn bins_for(extent: f64, bin_size: f64) -> usize {
    bin_count(extent, bin_size) as usize
}
