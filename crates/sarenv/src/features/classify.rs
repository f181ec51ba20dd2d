//! Classification of raw features into weighted, categorized [`Feature`]s.
use tracing::debug;

use super::category::{category_set, CategorySet, Footprint};
use super::{Feature, RawFeature};
use crate::config::{Climate, EnvironmentType};
use crate::error::Result;
use crate::geometry::{FeatureGeometry, Region};

/// Assigns categories and footprint-proportional `area_probability` weights.
#[derive(Debug, Clone, Copy)]
pub struct FeatureClassifier {
    set: &'static CategorySet,
}

impl FeatureClassifier {
    /// Fails with [`crate::error::Error::UnsupportedConfiguration`] when the pair has no
    /// category set.
    pub fn new(climate: Climate, environment_type: EnvironmentType) -> Result<Self> {
        Ok(Self {
            set: category_set(climate, environment_type)?,
        })
    }

    pub fn category_set(&self) -> &'static CategorySet {
        self.set
    }

    /// Classifies the features that touch `region`.
    ///
    /// Features without a matching category, with malformed geometry, or with a zero
    /// footprint are dropped. The result is empty when nothing survives.
    pub fn classify(&self, raw: &[RawFeature], region: &Region) -> Vec<Feature> {
        let mut out = Vec::with_capacity(raw.len());
        let mut unmatched = 0usize;
        let mut outside = 0usize;

        for feature in raw {
            if !feature.geometry.is_well_formed() {
                debug!("Skipping malformed {} feature.", feature.geometry.type_name());
                continue;
            }
            let Some(rule) = self.set.classify(&feature.tags) else {
                unmatched += 1;
                continue;
            };
            let local = feature.geometry.project(region.frame());
            if !region.intersects_local(&local) {
                outside += 1;
                continue;
            }
            let footprint = footprint_m2(&local, rule.footprint);
            if !footprint.is_finite() || footprint <= 0.0 {
                continue;
            }
            out.push(Feature {
                feature_type: rule.category,
                area_probability: footprint,
                geometry: feature.geometry.clone(),
            });
        }

        debug!(
            "Classified {} of {} features ({} unmatched, {} outside the region).",
            out.len(),
            raw.len(),
            unmatched,
            outside
        );

        if !normalize_area_probabilities(&mut out) {
            out.clear();
        }
        out
    }
}

/// Footprint of a projected geometry in square meters: polygon area, line length times
/// the equivalent width, or the area of a disc of the equivalent radius.
pub fn footprint_m2(local: &FeatureGeometry, footprint: Footprint) -> f64 {
    match local {
        FeatureGeometry::Polygon(_) => local.area(),
        FeatureGeometry::Line(_) => local.length() * footprint.line_width_m,
        FeatureGeometry::Point(_) => {
            std::f64::consts::PI * footprint.point_radius_m * footprint.point_radius_m
        }
    }
}

/// Rescales `area_probability` so the values sum to one. Returns `false` (leaving the
/// features untouched) when the total is not positive.
pub fn normalize_area_probabilities(features: &mut [Feature]) -> bool {
    let total: f64 = features.iter().map(|f| f.area_probability).sum();
    if !total.is_finite() || total <= 0.0 {
        return false;
    }
    for f in features.iter_mut() {
        f.area_probability /= total;
    }
    true
}
