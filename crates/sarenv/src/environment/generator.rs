//! Environment generation from a feature source, and dataset export.
use std::path::Path;

use tracing::{error, info};

use super::Environment;
use crate::config::{Climate, EnvironmentType, GeneratorConfig, SizeTier};
use crate::dataset::{write_dataset, ExportSummary};
use crate::error::Result;
use crate::features::{FeatureClassifier, FeatureSource};
use crate::geometry::{LonLat, Region, RegionInput};

/// Builds [`Environment`]s by fetching raw features, classifying them, and baking surfaces.
///
/// Generation calls return typed errors. The export calls log failures and return `None`.
pub struct DataGenerator {
    source: Box<dyn FeatureSource>,
    config: GeneratorConfig,
}

impl std::fmt::Debug for DataGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DataGenerator {
    pub fn new(source: impl FeatureSource + 'static, config: GeneratorConfig) -> Self {
        Self {
            source: Box::new(source),
            config,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Generates an environment over exactly the given polygon.
    pub fn generate_environment_from_polygon(
        &self,
        polygon: impl Into<RegionInput>,
        meter_per_bin: f64,
    ) -> Result<Environment> {
        let region = polygon.into().into_region()?;
        self.generate_for_region(region, &self.config.clone().with_meter_per_bin(meter_per_bin))
    }

    /// Generates an environment inside the circle of a size tier around `center`.
    pub fn generate_environment(
        &self,
        center: LonLat,
        size: SizeTier,
        meter_per_bin: f64,
    ) -> Result<Environment> {
        let radius_km = size.radius_km(self.config.climate, self.config.environment_type);
        self.generate_environment_with_radius(center, radius_km, meter_per_bin)
    }

    /// Generates an environment inside a circle of `radius_km` around `center`.
    pub fn generate_environment_with_radius(
        &self,
        center: LonLat,
        radius_km: f64,
        meter_per_bin: f64,
    ) -> Result<Environment> {
        let region = Region::circle(center, radius_km * 1_000.0)?;
        self.generate_for_region(region, &self.config.clone().with_meter_per_bin(meter_per_bin))
    }

    /// Runs classification and surface construction for a validated region.
    pub fn generate_for_region(
        &self,
        region: Region,
        config: &GeneratorConfig,
    ) -> Result<Environment> {
        config.validate()?;
        let classifier = FeatureClassifier::new(config.climate, config.environment_type)?;
        let raw = self.source.fetch(&region)?;
        let features = classifier.classify(&raw, &region);
        let environment = Environment::from_features(region, features, config)?;
        info!(
            "Generated {} / {} environment: {} features, {:.0} m², {}x{} bins.",
            config.climate,
            config.environment_type,
            environment.features().len(),
            environment.area_m2(),
            environment.grid().width,
            environment.grid().height
        );
        Ok(environment)
    }

    /// Generates the largest size tier around `center` and writes it to `output_directory`.
    ///
    /// The metadata records every tier's radius so
    /// [`DatasetLoader`](crate::dataset::DatasetLoader) can cut out the smaller ones.
    pub fn export_dataset(
        &self,
        center: LonLat,
        output_directory: impl AsRef<Path>,
        climate: Climate,
        environment_type: EnvironmentType,
        meter_per_bin: f64,
    ) -> Option<ExportSummary> {
        let config = GeneratorConfig {
            climate,
            environment_type,
            ..self.config.clone()
        }
        .with_meter_per_bin(meter_per_bin);
        let sizes: Vec<(SizeTier, f64)> = SizeTier::ALL
            .iter()
            .map(|tier| (*tier, tier.radius_km(climate, environment_type)))
            .collect();
        let radius_km = SizeTier::XLarge.radius_km(climate, environment_type);

        let result = Region::circle(center, radius_km * 1_000.0)
            .and_then(|region| self.generate_for_region(region, &config))
            .and_then(|env| write_dataset(output_directory.as_ref(), &env, &sizes));
        log_export(result, output_directory.as_ref())
    }

    /// Generates an environment over `polygon` and writes it to `output_directory`.
    pub fn export_dataset_from_polygon(
        &self,
        polygon: impl Into<RegionInput>,
        output_directory: impl AsRef<Path>,
        climate: Climate,
        environment_type: EnvironmentType,
        meter_per_bin: f64,
    ) -> Option<ExportSummary> {
        let config = GeneratorConfig {
            climate,
            environment_type,
            ..self.config.clone()
        }
        .with_meter_per_bin(meter_per_bin);

        let result = polygon
            .into()
            .into_region()
            .and_then(|region| self.generate_for_region(region, &config))
            .and_then(|env| write_dataset(output_directory.as_ref(), &env, &[]));
        log_export(result, output_directory.as_ref())
    }
}

fn log_export(result: Result<ExportSummary>, directory: &Path) -> Option<ExportSummary> {
    match result {
        Ok(summary) => Some(summary),
        Err(e) => {
            error!("Dataset export to '{}' failed: {}", directory.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use geo::point;

    use super::*;
    use crate::error::Error;
    use crate::features::{InMemoryFeatureSource, RawFeature};
    use crate::geometry::FeatureGeometry;

    struct FailingSource;

    impl FeatureSource for FailingSource {
        fn fetch(&self, _region: &Region) -> Result<Vec<RawFeature>> {
            Err(Error::FeatureSource("service unavailable".into()))
        }
    }

    fn source() -> InMemoryFeatureSource {
        InMemoryFeatureSource::new(vec![
            RawFeature::new(FeatureGeometry::Point(point!(x: 10.0, y: 55.0)))
                .with_tag("building", "yes"),
            RawFeature::new(FeatureGeometry::Point(point!(x: 10.002, y: 55.001)))
                .with_tag("natural", "scrub"),
        ])
    }

    #[test]
    fn center_generation_uses_the_tier_radius() {
        let generator = DataGenerator::new(source(), GeneratorConfig::default());
        let env = generator
            .generate_environment(LonLat::new(10.0, 55.0), SizeTier::Small, 30.0)
            .unwrap();
        let (min, max) = env.region().bounds();
        assert!((max.x - min.x - 1_200.0).abs() < 1e-6);
        assert_eq!(env.features().len(), 2);
        assert!(env.combined_heatmap().unwrap().is_normalized());
    }

    #[test]
    fn unsupported_pair_fails_before_fetching() {
        let config = GeneratorConfig::new(Climate::Dry, EnvironmentType::Mountainous);
        let generator = DataGenerator::new(FailingSource, config);
        let err = generator
            .generate_environment(LonLat::new(10.0, 55.0), SizeTier::Small, 30.0)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedConfiguration { .. }));
    }

    #[test]
    fn source_failures_propagate() {
        let generator = DataGenerator::new(FailingSource, GeneratorConfig::default());
        let err = generator
            .generate_environment_with_radius(LonLat::new(10.0, 55.0), 0.5, 30.0)
            .unwrap_err();
        assert!(matches!(err, Error::FeatureSource(_)));
    }

    #[test]
    fn invalid_inputs_are_typed_errors() {
        let generator = DataGenerator::new(source(), GeneratorConfig::default());
        let open_ring = vec![[10.0, 55.0], [10.1, 55.0], [10.1, 55.1], [10.0, 55.1]];
        assert!(matches!(
            generator.generate_environment_from_polygon(open_ring, 30.0),
            Err(Error::InvalidGeometry(_))
        ));
        assert!(matches!(
            generator.generate_environment(LonLat::new(10.0, 55.0), SizeTier::Small, 0.0),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn export_failures_return_none() {
        let generator = DataGenerator::new(FailingSource, GeneratorConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let summary = generator.export_dataset(
            LonLat::new(10.0, 55.0),
            dir.path(),
            Climate::Temperate,
            EnvironmentType::Flat,
            30.0,
        );
        assert!(summary.is_none());
        assert!(!dir.path().join(crate::dataset::METADATA_FILE).exists());
    }
}
