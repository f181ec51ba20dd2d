//! Dataset artifacts: export of an environment to a directory and loading it back.
//!
//! A dataset directory holds `heatmap.npy` (the combined surface, row 0 north),
//! `features.geojson` (classified features with `feature_type` and `area_probability`) and
//! `metadata.json` (climate, terrain, resolution, region and size tiers).
pub mod export;
pub mod geojson;
pub mod loader;
pub mod metadata;
pub mod npy;

pub use export::{write_dataset, ExportSummary, FEATURES_FILE, HEATMAP_FILE, METADATA_FILE};
pub use loader::DatasetLoader;
pub use metadata::DatasetMetadata;
