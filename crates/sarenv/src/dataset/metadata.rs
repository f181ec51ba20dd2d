//! The `metadata.json` document describing an exported dataset.
use geo::Polygon;
use serde_json::{json, Map, Value};

use super::geojson;
use crate::config::{Climate, EnvironmentType, SizeTier};
use crate::error::{Error, Result};
use crate::geometry::{LonLat, Region, RegionShape};

/// Description of an exported dataset: how it was generated and over which region.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetMetadata {
    pub climate: Climate,
    pub environment_type: EnvironmentType,
    pub meter_per_bin: f64,
    /// The exported region in lon/lat.
    pub region: RegionShape,
    /// Radius in km per size tier. Empty for polygon exports.
    pub sizes: Vec<(SizeTier, f64)>,
}

fn malformed(msg: impl Into<String>) -> Error {
    Error::Dataset(format!("metadata: {}", msg.into()))
}

impl DatasetMetadata {
    /// Radius in km recorded for `size`.
    pub fn size_radius_km(&self, size: SizeTier) -> Option<f64> {
        self.sizes.iter().find(|(s, _)| *s == size).map(|(_, r)| *r)
    }

    /// Rebuilds the exported region.
    pub fn region(&self) -> Result<Region> {
        match &self.region {
            RegionShape::Polygon(p) => {
                Region::polygon(p.exterior().coords().map(|c| LonLat::from(*c)).collect())
            }
            RegionShape::Circle { center, radius_m } => Region::circle(*center, *radius_m),
        }
    }

    pub fn to_value(&self) -> Value {
        let region = match &self.region {
            RegionShape::Polygon(p) => json!({
                "kind": "polygon",
                "ring": ring_value(p),
            }),
            RegionShape::Circle { center, radius_m } => json!({
                "kind": "circle",
                "center": [center.lon, center.lat],
                "radius_m": radius_m,
            }),
        };
        let sizes: Map<String, Value> = self
            .sizes
            .iter()
            .map(|(tier, km)| (tier.as_str().to_owned(), json!(km)))
            .collect();
        json!({
            "climate": self.climate.as_str(),
            "environment_type": self.environment_type.as_str(),
            "meter_per_bin": self.meter_per_bin,
            "region": region,
            "sizes": sizes,
        })
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .ok_or_else(|| malformed(format!("missing '{key}'")))
        };
        let climate: Climate = text("climate")?.parse()?;
        let environment_type: EnvironmentType = text("environment_type")?.parse()?;
        let meter_per_bin = value
            .get("meter_per_bin")
            .and_then(Value::as_f64)
            .ok_or_else(|| malformed("missing 'meter_per_bin'"))?;

        let region = value
            .get("region")
            .ok_or_else(|| malformed("missing 'region'"))?;
        let region = match region.get("kind").and_then(Value::as_str) {
            Some("polygon") => {
                let ring = geojson::positions(
                    region.get("ring").ok_or_else(|| malformed("polygon has no 'ring'"))?,
                )?;
                RegionShape::Polygon(Polygon::new(
                    ring.into_iter().map(geo::Coord::from).collect(),
                    Vec::new(),
                ))
            }
            Some("circle") => {
                let center = geojson::position(
                    region.get("center").ok_or_else(|| malformed("circle has no 'center'"))?,
                )?;
                let radius_m = region
                    .get("radius_m")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| malformed("circle has no 'radius_m'"))?;
                RegionShape::Circle { center, radius_m }
            }
            other => return Err(malformed(format!("unknown region kind {other:?}"))),
        };

        let mut sizes = Vec::new();
        if let Some(map) = value.get("sizes").and_then(Value::as_object) {
            for (name, km) in map {
                let km = km
                    .as_f64()
                    .ok_or_else(|| malformed(format!("size '{name}' is not a number")))?;
                sizes.push((name.parse::<SizeTier>()?, km));
            }
        }
        sizes.sort_by_key(|(tier, _)| *tier as usize);

        Ok(Self {
            climate,
            environment_type,
            meter_per_bin,
            region,
            sizes,
        })
    }
}

fn ring_value(polygon: &Polygon<f64>) -> Value {
    Value::Array(polygon.exterior().coords().map(|c| json!([c.x, c.y])).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle_metadata() -> DatasetMetadata {
        DatasetMetadata {
            climate: Climate::Dry,
            environment_type: EnvironmentType::Flat,
            meter_per_bin: 25.0,
            region: RegionShape::Circle {
                center: LonLat::new(-111.5, 34.25),
                radius_m: 14_400.0,
            },
            sizes: SizeTier::ALL
                .iter()
                .map(|t| (*t, t.radius_km(Climate::Dry, EnvironmentType::Flat)))
                .collect(),
        }
    }

    #[test]
    fn circle_metadata_survives_json() {
        let meta = circle_metadata();
        let value = meta.to_value();
        assert_eq!(value["region"]["kind"], "circle");
        assert_eq!(value["sizes"]["xlarge"], 14.4);
        assert_eq!(DatasetMetadata::from_value(&value).unwrap(), meta);
        assert_eq!(meta.size_radius_km(SizeTier::Medium), Some(2.3));
    }

    #[test]
    fn polygon_metadata_rebuilds_the_region() {
        let ring = vec![
            LonLat::new(10.0, 55.0),
            LonLat::new(10.5, 55.0),
            LonLat::new(10.5, 55.25),
            LonLat::new(10.0, 55.0),
        ];
        let region = Region::polygon(ring).unwrap();
        let meta = DatasetMetadata {
            climate: Climate::Temperate,
            environment_type: EnvironmentType::Mountainous,
            meter_per_bin: 30.0,
            region: region.shape().clone(),
            sizes: Vec::new(),
        };
        let back = DatasetMetadata::from_value(&meta.to_value()).unwrap();
        assert_eq!(back, meta);
        assert_eq!(back.region().unwrap().bounds(), region.bounds());
    }

    #[test]
    fn bad_documents_are_rejected() {
        let mut value = circle_metadata().to_value();
        value["climate"] = json!("polar");
        assert!(DatasetMetadata::from_value(&value)
            .unwrap_err()
            .is_unsupported_configuration());

        let mut value = circle_metadata().to_value();
        value["region"]["kind"] = json!("hexagon");
        assert!(matches!(
            DatasetMetadata::from_value(&value),
            Err(Error::Dataset(_))
        ));
    }
}
