//! Raw and classified geographic features.
//!
//! Raw features arrive from a [`FeatureSource`] as geometry plus OSM-style tags. The
//! [`FeatureClassifier`] turns them into [`Feature`]s carrying a [`FeatureCategory`] and an
//! `area_probability` weight.
use std::collections::BTreeMap;

use crate::geometry::FeatureGeometry;

pub mod category;
pub mod classify;
pub mod source;

pub use category::{category_set, CategoryRule, CategorySet, FeatureCategory, Footprint, TagRule};
pub use classify::{normalize_area_probabilities, FeatureClassifier};
pub use source::{FeatureSource, GeoJsonFeatureSource, InMemoryFeatureSource};

/// An unclassified feature: lon/lat geometry and its tags.
#[derive(Clone, Debug, PartialEq)]
pub struct RawFeature {
    pub geometry: FeatureGeometry,
    pub tags: BTreeMap<String, String>,
}

impl RawFeature {
    pub fn new(geometry: FeatureGeometry) -> Self {
        Self {
            geometry,
            tags: BTreeMap::new(),
        }
    }

    /// Adds a tag (builder-style).
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// A classified feature. Within one environment the `area_probability` values sum to one.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub feature_type: FeatureCategory,
    pub area_probability: f64,
    /// Lon/lat geometry.
    pub geometry: FeatureGeometry,
}
