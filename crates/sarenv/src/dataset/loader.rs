//! Reading an exported dataset directory back into environments.
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::export::{FEATURES_FILE, HEATMAP_FILE, METADATA_FILE};
use super::geojson::features_from_collection;
use super::metadata::DatasetMetadata;
use super::npy;
use crate::config::{GeneratorConfig, SizeTier, DEFAULT_MAX_CELLS};
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::features::Feature;
use crate::geometry::{Region, RegionShape};
use crate::surface::{BinGrid, Heatmap};

/// Loads environments from a directory written by
/// [`DataGenerator::export_dataset`](crate::environment::DataGenerator::export_dataset).
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    directory: PathBuf,
    metadata: DatasetMetadata,
}

impl DatasetLoader {
    /// Opens a dataset directory and reads its metadata.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        let text = fs::read_to_string(directory.join(METADATA_FILE))?;
        let metadata = DatasetMetadata::from_value(&serde_json::from_str(&text)?)?;
        debug!(
            "Opened dataset '{}' ({} / {}, {} m per bin).",
            directory.display(),
            metadata.climate,
            metadata.environment_type,
            metadata.meter_per_bin
        );
        Ok(Self {
            directory,
            metadata,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    /// All exported features with their stored weights.
    pub fn load_features(&self) -> Result<Vec<Feature>> {
        let text = fs::read_to_string(self.directory.join(FEATURES_FILE))?;
        features_from_collection(&serde_json::from_str(&text)?)
    }

    /// The region of one size tier.
    ///
    /// Circle exports are cut down to the tier's radius around the exported center. Polygon
    /// exports have a single region that serves every tier.
    pub fn region_for(&self, size: SizeTier) -> Result<Region> {
        match &self.metadata.region {
            RegionShape::Circle { center, .. } => {
                let km = self.metadata.size_radius_km(size).unwrap_or_else(|| {
                    size.radius_km(self.metadata.climate, self.metadata.environment_type)
                });
                Region::circle(*center, km * 1_000.0)
            }
            RegionShape::Polygon(_) => self.metadata.region(),
        }
    }

    /// Rebuilds the environment of a size tier at the stored resolution. Features not
    /// touching the tier's region are dropped and the rest renormalized.
    pub fn load_environment(&self, size: SizeTier) -> Result<Environment> {
        let region = self.region_for(size)?;
        let mut features = self.load_features()?;
        let total = features.len();
        features.retain(|f| region.intersects(&f.geometry));

        let config = GeneratorConfig::new(self.metadata.climate, self.metadata.environment_type)
            .with_meter_per_bin(self.metadata.meter_per_bin);
        let environment = Environment::from_features(region, features, &config)?;
        info!(
            "Loaded '{}' environment with {} of {} features.",
            size,
            environment.features().len(),
            total
        );
        Ok(environment)
    }

    /// The stored combined surface of the full exported region, if one was written.
    ///
    /// A raster that cannot be read or does not fit the region grid is an
    /// [`Error::Dataset`].
    pub fn load_heatmap(&self) -> Result<Option<Heatmap>> {
        let path = self.directory.join(HEATMAP_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let array = npy::read(&path)?;
        let region = self.metadata.region()?;
        let (min, max) = region.bounds();
        let grid = BinGrid::try_covering(min, max, self.metadata.meter_per_bin, DEFAULT_MAX_CELLS)?;
        if array.shape != (grid.height, grid.width) {
            return Err(Error::Dataset(format!(
                "raster shape {:?} does not match the region grid ({}, {})",
                array.shape, grid.height, grid.width
            )));
        }
        Heatmap::from_data(grid, array.data)
            .map(Some)
            .map_err(|e| Error::Dataset(format!("raster: {e}")))
    }
}
