//! Probability surfaces: the bin grid, heatmap storage, per-type rasterization and the
//! combined surface.
pub mod builder;
pub mod combine;
pub mod grid;
pub mod raster;

pub use builder::{for_each_cell_inside, region_mask, SurfaceBuilder};
pub use combine::{combine, type_masses};
pub use grid::BinGrid;
pub use raster::{Heatmap, PROBABILITY_TOLERANCE};
