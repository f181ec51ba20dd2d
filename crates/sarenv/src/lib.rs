#![forbid(unsafe_code)]
//! sarenv: search-and-rescue environments and synthetic lost-person locations.
//!
//! Modules:
//! - features: raw and classified features, the category tables, and the feature source seam
//! - surface: bin grid, heatmaps, per-category rasterization, combined surface
//! - environment: the frozen `Environment` value and the `DataGenerator`
//! - sampling: uniform and density-weighted position sampling, lost-person locations
//! - dataset: export to `heatmap.npy` / `features.geojson` / `metadata.json` and loading
//!
//! For examples, see the README and the `sarenv_examples` crate.
pub mod config;
pub mod dataset;
pub mod environment;
pub mod error;
pub mod features;
pub mod geometry;
pub mod sampling;
pub mod surface;

pub use error::{Error, Result};

/// Convenient re-exports for common types. Import with `use sarenv::prelude::*;`.
pub mod prelude {
    pub use crate::config::{
        Climate, EnvironmentType, GeneratorConfig, SizeTier, DEFAULT_METER_PER_BIN,
    };
    pub use crate::dataset::{DatasetLoader, DatasetMetadata, ExportSummary};
    pub use crate::environment::{DataGenerator, Environment};
    pub use crate::error::{Error, Result};
    pub use crate::features::{
        Feature, FeatureCategory, FeatureClassifier, FeatureSource, GeoJsonFeatureSource,
        InMemoryFeatureSource, RawFeature,
    };
    pub use crate::geometry::{FeatureGeometry, LonLat, Region, RegionInput};
    pub use crate::sampling::{
        LostPersonLocationGenerator, PositionSampling, UniformRegionSampling,
        WeightedCellSampling,
    };
    pub use crate::surface::{BinGrid, Heatmap};
}
