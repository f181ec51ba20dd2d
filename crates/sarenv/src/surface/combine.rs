//! Weighted aggregation of per-type surfaces into the combined surface.
use std::collections::BTreeMap;

use super::raster::Heatmap;
use crate::error::{Error, Result};
use crate::features::{Feature, FeatureCategory};

/// Aggregate `area_probability` per category.
pub fn type_masses(features: &[Feature]) -> BTreeMap<FeatureCategory, f64> {
    let mut masses = BTreeMap::new();
    for f in features {
        *masses.entry(f.feature_type).or_insert(0.0) += f.area_probability;
    }
    masses
}

/// Sums `mass * surface` over all categories and renormalizes to unit total.
///
/// Fails with [`Error::EmptySurface`] when the weighted sum is zero everywhere, or when
/// there are no surfaces at all.
pub fn combine(
    surfaces: &BTreeMap<FeatureCategory, Heatmap>,
    masses: &BTreeMap<FeatureCategory, f64>,
) -> Result<Heatmap> {
    let Some(first) = surfaces.values().next() else {
        return Err(Error::EmptySurface);
    };
    let mut combined = Heatmap::new(first.grid.clone());
    for (category, surface) in surfaces {
        let mass = masses.get(category).copied().unwrap_or(0.0);
        if mass > 0.0 {
            combined.add_scaled(surface, mass);
        }
    }
    combined.normalize()?;
    Ok(combined)
}
