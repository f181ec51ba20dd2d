//! Writing an [`Environment`] to a dataset directory.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use super::geojson::features_to_collection;
use super::metadata::DatasetMetadata;
use super::npy;
use crate::config::SizeTier;
use crate::environment::Environment;
use crate::error::Result;

/// Combined surface raster, written only when the surface exists.
pub const HEATMAP_FILE: &str = "heatmap.npy";
/// Classified features as a GeoJSON FeatureCollection.
pub const FEATURES_FILE: &str = "features.geojson";
/// Generation parameters and region description.
pub const METADATA_FILE: &str = "metadata.json";

/// What an export wrote.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportSummary {
    pub directory: PathBuf,
    /// `None` when the environment had no combined surface.
    pub heatmap: Option<PathBuf>,
    pub features: PathBuf,
    pub metadata: PathBuf,
    pub feature_count: usize,
    /// `(rows, columns)` of the written raster.
    pub shape: Option<(usize, usize)>,
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Writes the three dataset artifacts into `directory`, creating it if needed.
///
/// `sizes` is recorded in the metadata so the loader can cut smaller tiers out of the
/// exported region. A stale `heatmap.npy` is removed when there is no combined surface.
pub fn write_dataset(
    directory: &Path,
    environment: &Environment,
    sizes: &[(SizeTier, f64)],
) -> Result<ExportSummary> {
    fs::create_dir_all(directory)?;

    let features = directory.join(FEATURES_FILE);
    write_json(&features, &features_to_collection(environment.features()))?;

    let metadata = directory.join(METADATA_FILE);
    let meta = DatasetMetadata {
        climate: environment.climate(),
        environment_type: environment.environment_type(),
        meter_per_bin: environment.meter_per_bin(),
        region: environment.region().shape().clone(),
        sizes: sizes.to_vec(),
    };
    write_json(&metadata, &meta.to_value())?;

    let heatmap_path = directory.join(HEATMAP_FILE);
    let (heatmap, shape) = match environment.combined_heatmap() {
        Some(heatmap) => {
            let (rows, cols) = heatmap.shape();
            npy::write(&heatmap_path, rows, cols, &heatmap.data)?;
            (Some(heatmap_path), Some((rows, cols)))
        }
        None => {
            if heatmap_path.exists() {
                fs::remove_file(&heatmap_path)?;
            }
            (None, None)
        }
    };

    info!(
        "Exported {} features to '{}' (raster: {:?}).",
        environment.features().len(),
        directory.display(),
        shape
    );

    Ok(ExportSummary {
        directory: directory.to_path_buf(),
        heatmap,
        features,
        metadata,
        feature_count: environment.features().len(),
        shape,
    })
}
