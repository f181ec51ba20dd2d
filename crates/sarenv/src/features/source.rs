//! Feature acquisition seam.
//!
//! Implement [`FeatureSource`] to feed raw features from any backend (a tile cache, an
//! Overpass client, a database). Two sources ship with the crate: an in-memory list and a
//! GeoJSON file of tagged features.
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::RawFeature;
use crate::dataset::geojson;
use crate::error::{Error, Result};
use crate::geometry::Region;

/// Supplies the raw features around a region.
///
/// Implementations may return features outside the region; the classifier drops them.
pub trait FeatureSource: Send + Sync {
    fn fetch(&self, region: &Region) -> Result<Vec<RawFeature>>;
}

impl<T: FeatureSource + ?Sized> FeatureSource for Arc<T> {
    fn fetch(&self, region: &Region) -> Result<Vec<RawFeature>> {
        (**self).fetch(region)
    }
}

impl<T: FeatureSource + ?Sized> FeatureSource for Box<T> {
    fn fetch(&self, region: &Region) -> Result<Vec<RawFeature>> {
        (**self).fetch(region)
    }
}

/// A fixed list of features, filtered to those touching the requested region.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFeatureSource {
    features: Vec<RawFeature>,
}

impl InMemoryFeatureSource {
    pub fn new(features: Vec<RawFeature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FeatureSource for InMemoryFeatureSource {
    fn fetch(&self, region: &Region) -> Result<Vec<RawFeature>> {
        Ok(self
            .features
            .iter()
            .filter(|f| f.geometry.is_well_formed() && region.intersects(&f.geometry))
            .cloned()
            .collect())
    }
}

/// Reads a GeoJSON `FeatureCollection` whose properties are string tags.
///
/// The file is re-read on every fetch so edits are picked up between generations.
#[derive(Debug, Clone)]
pub struct GeoJsonFeatureSource {
    path: PathBuf,
}

impl GeoJsonFeatureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FeatureSource for GeoJsonFeatureSource {
    fn fetch(&self, region: &Region) -> Result<Vec<RawFeature>> {
        let text = fs::read_to_string(&self.path).map_err(|e| {
            Error::FeatureSource(format!("cannot read '{}': {e}", self.path.display()))
        })?;
        let all = geojson::parse_raw_features(&text)
            .map_err(|e| Error::FeatureSource(format!("'{}': {e}", self.path.display())))?;
        InMemoryFeatureSource::new(all).fetch(region)
    }
}
