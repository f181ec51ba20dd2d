//! The [`Environment`] value object and the [`DataGenerator`] that builds it.
//!
//! An environment is computed once and frozen: classified features, one probability surface
//! per feature category, and the combined surface (absent when the region holds no mass).
use std::collections::BTreeMap;

use tracing::debug;

use crate::config::{Climate, EnvironmentType, GeneratorConfig};
use crate::error::{Error, Result};
use crate::features::{category_set, normalize_area_probabilities, Feature, FeatureCategory};
use crate::geometry::Region;
use crate::surface::{combine, type_masses, BinGrid, Heatmap, SurfaceBuilder};

pub mod generator;

pub use generator::DataGenerator;

/// A search area with its classified features and probability surfaces.
#[derive(Clone, Debug)]
pub struct Environment {
    config: GeneratorConfig,
    region: Region,
    grid: BinGrid,
    features: Vec<Feature>,
    type_heatmaps: BTreeMap<FeatureCategory, Heatmap>,
    combined: Option<Heatmap>,
}

impl Environment {
    /// Builds the surfaces for already-classified features.
    ///
    /// Features that do not touch the region are dropped, then `area_probability` values are
    /// renormalized to sum to one. Features carrying no probability at all are discarded,
    /// leaving an environment without a combined surface. Otherwise every remaining feature
    /// reaches at least one bin and the combined surface sums to one.
    ///
    /// Fails with [`Error::InvalidInput`] when a weight is negative or not finite.
    pub fn from_features(
        region: Region,
        mut features: Vec<Feature>,
        config: &GeneratorConfig,
    ) -> Result<Self> {
        config.validate()?;
        let set = category_set(config.climate, config.environment_type)?;
        let (min, max) = region.bounds();
        let grid = BinGrid::try_covering(min, max, config.meter_per_bin, config.max_cells)?;

        if let Some(bad) = features
            .iter()
            .find(|f| !f.area_probability.is_finite() || f.area_probability < 0.0)
        {
            return Err(Error::InvalidInput(format!(
                "{} feature has area_probability {}",
                bad.feature_type, bad.area_probability
            )));
        }

        let before = features.len();
        features.retain(|f| region.intersects(&f.geometry));
        if features.len() < before {
            debug!(
                "Dropped {} features outside the region.",
                before - features.len()
            );
        }

        if !normalize_area_probabilities(&mut features) {
            features.clear();
        }

        let builder = SurfaceBuilder::new(&region, grid.clone());
        let type_heatmaps = builder.bake_all(&features, set);
        let combined = match combine(&type_heatmaps, &type_masses(&features)) {
            Ok(heatmap) => Some(heatmap),
            Err(Error::EmptySurface) => {
                debug!(
                    "No mass inside the region from {} features; combined surface absent.",
                    features.len()
                );
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            config: config.clone(),
            region,
            grid,
            features,
            type_heatmaps,
            combined,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn climate(&self) -> Climate {
        self.config.climate
    }

    pub fn environment_type(&self) -> EnvironmentType {
        self.config.environment_type
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Region area in square meters.
    pub fn area_m2(&self) -> f64 {
        self.region.area_m2()
    }

    pub fn meter_per_bin(&self) -> f64 {
        self.grid.bin_size
    }

    pub fn grid(&self) -> &BinGrid {
        &self.grid
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn features_of(&self, category: FeatureCategory) -> impl Iterator<Item = &Feature> + '_ {
        self.features
            .iter()
            .filter(move |f| f.feature_type == category)
    }

    /// Categories with at least one feature, in category order.
    pub fn feature_types(&self) -> Vec<FeatureCategory> {
        let mut types: Vec<_> = self.features.iter().map(|f| f.feature_type).collect();
        types.sort_unstable();
        types.dedup();
        types
    }

    pub fn type_heatmap(&self, category: FeatureCategory) -> Option<&Heatmap> {
        self.type_heatmaps.get(&category)
    }

    pub fn type_heatmaps(&self) -> &BTreeMap<FeatureCategory, Heatmap> {
        &self.type_heatmaps
    }

    /// The combined surface, or `None` when no feature put mass inside the region.
    pub fn combined_heatmap(&self) -> Option<&Heatmap> {
        self.combined.as_ref()
    }

    /// Fails with [`Error::EmptyRegion`] when the environment has no features.
    pub fn require_features(&self) -> Result<&Self> {
        if self.features.is_empty() {
            return Err(Error::EmptyRegion);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use geo::{line_string, point, polygon};

    use super::*;
    use crate::geometry::{FeatureGeometry, LonLat, RegionInput};

    fn region() -> Region {
        RegionInput::from(vec![
            [10.280, 55.140],
            [10.290, 55.140],
            [10.290, 55.146],
            [10.280, 55.146],
            [10.280, 55.140],
        ])
        .into_region()
        .unwrap()
    }

    fn features() -> Vec<Feature> {
        vec![
            Feature {
                feature_type: FeatureCategory::Woodland,
                area_probability: 3.0,
                geometry: FeatureGeometry::Polygon(polygon![
                    (x: 10.281, y: 55.141),
                    (x: 10.284, y: 55.141),
                    (x: 10.284, y: 55.143),
                    (x: 10.281, y: 55.143)
                ]),
            },
            Feature {
                feature_type: FeatureCategory::Road,
                area_probability: 1.0,
                geometry: FeatureGeometry::Line(line_string![
                    (x: 10.280, y: 55.145),
                    (x: 10.290, y: 55.145)
                ]),
            },
            Feature {
                feature_type: FeatureCategory::Structure,
                area_probability: 1.0,
                geometry: FeatureGeometry::Point(point!(x: 10.288, y: 55.141)),
            },
        ]
    }

    fn config() -> GeneratorConfig {
        GeneratorConfig::new(Climate::Temperate, EnvironmentType::Flat)
    }

    #[test]
    fn surfaces_are_normalized() {
        let env = Environment::from_features(region(), features(), &config()).unwrap();
        let total: f64 = env.features().iter().map(|f| f.area_probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
        let wood = env.features_of(FeatureCategory::Woodland).next().unwrap();
        assert!((wood.area_probability - 0.6).abs() < 1e-12);

        let combined = env.combined_heatmap().unwrap();
        assert!(combined.is_normalized());
        assert!(combined.data.iter().all(|v| *v >= 0.0));
        for category in env.feature_types() {
            assert!(env.type_heatmap(category).unwrap().is_normalized());
        }
        assert!(env.type_heatmap(FeatureCategory::Rock).unwrap().is_zero());
        assert_eq!(
            env.feature_types(),
            vec![
                FeatureCategory::Structure,
                FeatureCategory::Road,
                FeatureCategory::Woodland
            ]
        );
    }

    #[test]
    fn grid_follows_extent_and_resolution() {
        let env = Environment::from_features(region(), features(), &config()).unwrap();
        // ~637 m x 667 m.
        assert_eq!((env.grid().width, env.grid().height), (22, 23));
        assert_eq!(env.meter_per_bin(), 30.0);
        assert!(env.area_m2() > 0.0);
    }

    #[test]
    fn featureless_environment_has_no_combined_surface() {
        let env = Environment::from_features(region(), Vec::new(), &config()).unwrap();
        assert!(env.combined_heatmap().is_none());
        assert!(env.feature_types().is_empty());
        assert!(matches!(env.require_features(), Err(Error::EmptyRegion)));
    }

    #[test]
    fn features_outside_the_region_are_dropped() {
        let mut mixed = features();
        mixed.push(Feature {
            feature_type: FeatureCategory::Structure,
            area_probability: 5.0,
            geometry: FeatureGeometry::Point(point!(x: 11.0, y: 56.0)),
        });
        let env = Environment::from_features(region(), mixed, &config()).unwrap();
        assert_eq!(env.features().len(), 3);
        let wood = env.features_of(FeatureCategory::Woodland).next().unwrap();
        assert!((wood.area_probability - 0.6).abs() < 1e-12);
        assert!(env.combined_heatmap().unwrap().is_normalized());

        let far = vec![Feature {
            feature_type: FeatureCategory::Structure,
            area_probability: 1.0,
            geometry: FeatureGeometry::Point(point!(x: 11.0, y: 56.0)),
        }];
        let env = Environment::from_features(region(), far, &config()).unwrap();
        assert!(env.features().is_empty());
        assert!(env.combined_heatmap().is_none());
    }

    #[test]
    fn sliver_region_still_carries_its_features_mass() {
        // Far narrower than a 30 m bin, so hardly any bin center falls inside.
        let sliver = RegionInput::from(vec![
            [10.0, 55.0],
            [10.01, 55.01],
            [10.00002, 55.0],
            [10.0, 55.0],
        ])
        .into_region()
        .unwrap();

        for step in 1..50 {
            let t = step as f64 / 50.0;
            let lat = 55.0 + 0.01 * t;
            // Midway between the two long edges at this latitude.
            let lon = 10.0 + 0.01 * t + 0.00001 * (1.0 - t);
            let house = vec![Feature {
                feature_type: FeatureCategory::Structure,
                area_probability: 1.0,
                geometry: FeatureGeometry::Point(point!(x: lon, y: lat)),
            }];
            assert!(sliver.contains(LonLat::new(lon, lat)), "t = {t}");

            let env = Environment::from_features(sliver.clone(), house, &config()).unwrap();
            assert_eq!(env.features().len(), 1);
            let combined = env.combined_heatmap().unwrap_or_else(|| panic!("t = {t}"));
            assert!(combined.is_normalized(), "t = {t}");
        }
    }

    #[test]
    fn negative_weights_are_rejected() {
        let mut bad = features();
        bad[1].area_probability = -1.0;
        let err = Environment::from_features(region(), bad, &config()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)), "{err}");
    }

    #[test]
    fn non_finite_weights_are_rejected() {
        for weight in [f64::NAN, f64::INFINITY] {
            let mut bad = features();
            bad[2].area_probability = weight;
            let err = Environment::from_features(region(), bad, &config()).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{err}");
        }
    }

    #[test]
    fn oversized_grids_are_rejected() {
        let cfg = config().with_meter_per_bin(1.0).with_max_cells(1_000);
        let err = Environment::from_features(region(), features(), &cfg).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn unsupported_pair_is_rejected() {
        let cfg = GeneratorConfig::new(Climate::Dry, EnvironmentType::Mountainous);
        let circle = Region::circle(LonLat::new(10.0, 55.0), 500.0).unwrap();
        let err = Environment::from_features(circle, Vec::new(), &cfg).unwrap_err();
        assert!(err.is_unsupported_configuration());
    }

    #[test]
    fn environment_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Environment>();
    }
}
