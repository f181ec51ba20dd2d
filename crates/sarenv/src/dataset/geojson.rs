//! GeoJSON encoding of feature geometry and feature collections.
//!
//! Only the geometry types the crate models are written (`Point`, `LineString`, `Polygon`).
//! On read, `Multi*` geometries are split into their parts and other types are skipped.
use std::collections::BTreeMap;

use geo::{Coord, LineString, Point, Polygon};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::features::{Feature, FeatureCategory, RawFeature};
use crate::geometry::{FeatureGeometry, LonLat};

/// Property holding the category of an exported feature.
pub const FEATURE_TYPE_KEY: &str = "feature_type";
/// Property holding the probability weight of an exported feature.
pub const AREA_PROBABILITY_KEY: &str = "area_probability";

fn malformed(msg: impl Into<String>) -> Error {
    Error::Dataset(msg.into())
}

/// Parses a single `[lon, lat]` position. Extra components are ignored.
pub fn position(value: &Value) -> Result<LonLat> {
    match value.as_array().map(Vec::as_slice) {
        Some([lon, lat, ..]) => match (lon.as_f64(), lat.as_f64()) {
            (Some(lon), Some(lat)) => Ok(LonLat::new(lon, lat)),
            _ => Err(malformed("position components must be numbers")),
        },
        _ => Err(malformed("position must be an array of at least two numbers")),
    }
}

/// Parses an array of GeoJSON positions.
pub fn positions(value: &Value) -> Result<Vec<LonLat>> {
    value
        .as_array()
        .ok_or_else(|| malformed("expected an array of positions"))?
        .iter()
        .map(position)
        .collect()
}

fn line_string(value: &Value) -> Result<LineString<f64>> {
    Ok(positions(value)?.into_iter().map(Coord::from).collect())
}

fn polygon(value: &Value) -> Result<Polygon<f64>> {
    let rings = value
        .as_array()
        .ok_or_else(|| malformed("polygon coordinates must be an array of rings"))?;
    let (exterior, interiors) = rings
        .split_first()
        .ok_or_else(|| malformed("polygon has no rings"))?;
    let interiors = interiors.iter().map(line_string).collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(line_string(exterior)?, interiors))
}

fn parts(
    value: &Value,
    parse: impl Fn(&Value) -> Result<FeatureGeometry>,
) -> Result<Vec<FeatureGeometry>> {
    value
        .as_array()
        .ok_or_else(|| malformed("multi-geometry coordinates must be an array"))?
        .iter()
        .map(parse)
        .collect()
}

/// Decodes a GeoJSON geometry object. Returns an empty list for unsupported types.
pub fn geometry_from_value(value: &Value) -> Result<Vec<FeatureGeometry>> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("geometry has no type"))?;
    let coords = || {
        value
            .get("coordinates")
            .ok_or_else(|| malformed(format!("{kind} has no coordinates")))
    };
    match kind {
        "Point" => Ok(vec![FeatureGeometry::Point(Point::from(Coord::from(
            position(coords()?)?,
        )))]),
        "LineString" => Ok(vec![FeatureGeometry::Line(line_string(coords()?)?)]),
        "Polygon" => Ok(vec![FeatureGeometry::Polygon(polygon(coords()?)?)]),
        "MultiPoint" => parts(coords()?, |v| {
            Ok(FeatureGeometry::Point(Point::from(Coord::from(position(v)?))))
        }),
        "MultiLineString" => parts(coords()?, |v| Ok(FeatureGeometry::Line(line_string(v)?))),
        "MultiPolygon" => parts(coords()?, |v| Ok(FeatureGeometry::Polygon(polygon(v)?))),
        other => {
            debug!("Skipping unsupported GeoJSON geometry '{}'.", other);
            Ok(Vec::new())
        }
    }
}

fn ring_to_value(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().map(|c| json!([c.x, c.y])).collect())
}

/// Encodes a geometry as a GeoJSON geometry object.
pub fn geometry_to_value(geometry: &FeatureGeometry) -> Value {
    let coordinates = match geometry {
        FeatureGeometry::Point(p) => json!([p.x(), p.y()]),
        FeatureGeometry::Line(l) => ring_to_value(l),
        FeatureGeometry::Polygon(p) => Value::Array(
            std::iter::once(p.exterior())
                .chain(p.interiors())
                .map(ring_to_value)
                .collect(),
        ),
    };
    json!({"type": geometry.type_name(), "coordinates": coordinates})
}

fn collection_features(value: &Value) -> Result<&Vec<Value>> {
    if value.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(malformed("expected a FeatureCollection"));
    }
    value
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("FeatureCollection has no features array"))
}

/// Parses raw tagged features. Scalar properties become tags; nulls and nested values
/// are ignored.
pub fn parse_raw_features(text: &str) -> Result<Vec<RawFeature>> {
    let value: Value = serde_json::from_str(text)?;
    let mut out = Vec::new();
    for feature in collection_features(&value)? {
        let Some(geometry) = feature.get("geometry").filter(|g| !g.is_null()) else {
            continue;
        };
        let tags: BTreeMap<String, String> = feature
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .filter_map(|(k, v)| {
                        let value = match v {
                            Value::String(s) => s.clone(),
                            Value::Number(n) => n.to_string(),
                            Value::Bool(b) => if *b { "yes" } else { "no" }.to_owned(),
                            _ => return None,
                        };
                        Some((k.clone(), value))
                    })
                    .collect()
            })
            .unwrap_or_default();
        for geometry in geometry_from_value(geometry)? {
            out.push(RawFeature {
                geometry,
                tags: tags.clone(),
            });
        }
    }
    Ok(out)
}

/// Encodes classified features as a FeatureCollection.
pub fn features_to_collection(features: &[Feature]) -> Value {
    let features: Vec<Value> = features
        .iter()
        .map(|f| {
            let mut properties = Map::new();
            properties.insert(FEATURE_TYPE_KEY.into(), json!(f.feature_type.as_str()));
            properties.insert(AREA_PROBABILITY_KEY.into(), json!(f.area_probability));
            json!({
                "type": "Feature",
                "properties": properties,
                "geometry": geometry_to_value(&f.geometry),
            })
        })
        .collect();
    json!({"type": "FeatureCollection", "features": features})
}

/// Decodes classified features written by [`features_to_collection`].
pub fn features_from_collection(value: &Value) -> Result<Vec<Feature>> {
    let mut out = Vec::new();
    for (i, feature) in collection_features(value)?.iter().enumerate() {
        let props = feature
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| malformed(format!("feature {i} has no properties")))?;
        let feature_type: FeatureCategory = props
            .get(FEATURE_TYPE_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| malformed(format!("feature {i} has no {FEATURE_TYPE_KEY}")))?
            .parse()?;
        let area_probability = props
            .get(AREA_PROBABILITY_KEY)
            .and_then(Value::as_f64)
            .filter(|p| p.is_finite() && *p >= 0.0)
            .ok_or_else(|| {
                malformed(format!("feature {i} has no valid {AREA_PROBABILITY_KEY}"))
            })?;
        let geometry = feature
            .get("geometry")
            .ok_or_else(|| malformed(format!("feature {i} has no geometry")))?;
        for geometry in geometry_from_value(geometry)? {
            out.push(Feature {
                feature_type,
                area_probability,
                geometry,
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use geo::{line_string, point, polygon};

    use super::*;

    #[test]
    fn classified_features_keep_type_and_probability() {
        let features = vec![
            Feature {
                feature_type: FeatureCategory::Road,
                area_probability: 0.25,
                geometry: FeatureGeometry::Line(line_string![
                    (x: 10.0, y: 55.0),
                    (x: 10.125, y: 55.0)
                ]),
            },
            Feature {
                feature_type: FeatureCategory::Woodland,
                area_probability: 0.75,
                geometry: FeatureGeometry::Polygon(polygon![
                    (x: 10.0, y: 55.0),
                    (x: 10.125, y: 55.0),
                    (x: 10.125, y: 55.125)
                ]),
            },
        ];
        let value = features_to_collection(&features);
        assert_eq!(value["features"][0]["properties"]["feature_type"], "road");
        assert_eq!(value["features"][1]["geometry"]["type"], "Polygon");

        let back = features_from_collection(&value).unwrap();
        assert_eq!(back, features);
    }

    #[test]
    fn raw_features_split_multi_geometries() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature",
                 "properties": {"building": "yes", "levels": 2, "ruin": false, "note": null},
                 "geometry": {"type": "MultiPoint", "coordinates": [[10.0, 55.0], [10.1, 55.1]]}},
                {"type": "Feature", "properties": {}, "geometry": null},
                {"type": "Feature", "properties": {"x": "y"},
                 "geometry": {"type": "GeometryCollection", "geometries": []}}
            ]
        }"#;
        let raw = parse_raw_features(text).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].tags.get("levels").map(String::as_str), Some("2"));
        assert_eq!(raw[0].tags.get("ruin").map(String::as_str), Some("no"));
        assert!(!raw[0].tags.contains_key("note"));
        assert_eq!(raw[1].geometry, FeatureGeometry::Point(point!(x: 10.1, y: 55.1)));
    }

    #[test]
    fn malformed_documents_are_dataset_errors() {
        assert!(matches!(
            features_from_collection(&json!({"type": "Feature"})),
            Err(Error::Dataset(_))
        ));
        let missing_prob = json!({
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "properties": {"feature_type": "road"},
                          "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}}]
        });
        assert!(features_from_collection(&missing_prob).is_err());
        assert!(positions(&json!([[0.0, "a"]])).is_err());
        assert!(parse_raw_features("not json").is_err());
    }
}
