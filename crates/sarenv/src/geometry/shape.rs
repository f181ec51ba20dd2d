//! Point, line and polygon geometry carried by features.
use geo::{Area, BoundingRect, Centroid, LineString, MapCoords, Point, Polygon, Rect};
use glam::DVec2;

use super::{to_dvec, LocalFrame};

/// Geometry of a single feature. Coordinates are lon/lat (`x` = lon, `y` = lat) unless the
/// value came out of [`FeatureGeometry::project`], in which case they are local meters.
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureGeometry {
    Point(Point<f64>),
    Line(LineString<f64>),
    Polygon(Polygon<f64>),
}

impl FeatureGeometry {
    /// GeoJSON geometry type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            FeatureGeometry::Point(_) => "Point",
            FeatureGeometry::Line(_) => "LineString",
            FeatureGeometry::Polygon(_) => "Polygon",
        }
    }

    pub fn project(&self, frame: &LocalFrame) -> FeatureGeometry {
        match self {
            FeatureGeometry::Point(p) => {
                FeatureGeometry::Point(p.map_coords(|c| frame.project_coord(c)))
            }
            FeatureGeometry::Line(l) => {
                FeatureGeometry::Line(l.map_coords(|c| frame.project_coord(c)))
            }
            FeatureGeometry::Polygon(p) => {
                FeatureGeometry::Polygon(p.map_coords(|c| frame.project_coord(c)))
            }
        }
    }

    /// Returns `true` when the geometry has enough vertices and every coordinate is finite.
    pub fn is_well_formed(&self) -> bool {
        let finite = |c: &geo::Coord<f64>| c.x.is_finite() && c.y.is_finite();
        match self {
            FeatureGeometry::Point(p) => finite(&p.0),
            FeatureGeometry::Line(l) => l.0.len() >= 2 && l.0.iter().all(finite),
            FeatureGeometry::Polygon(p) => {
                p.exterior().0.len() >= 4 && p.exterior().0.iter().all(finite)
            }
        }
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            FeatureGeometry::Point(p) => Some(p.bounding_rect()),
            FeatureGeometry::Line(l) => l.bounding_rect(),
            FeatureGeometry::Polygon(p) => p.bounding_rect(),
        }
    }

    /// Total polyline length in coordinate units (meters for projected geometry).
    pub fn length(&self) -> f64 {
        match self {
            FeatureGeometry::Line(l) => l
                .lines()
                .map(|seg| (seg.end.x - seg.start.x).hypot(seg.end.y - seg.start.y))
                .sum(),
            _ => 0.0,
        }
    }

    /// Polygon area in squared coordinate units; zero for points and lines.
    pub fn area(&self) -> f64 {
        match self {
            FeatureGeometry::Polygon(p) => p.unsigned_area(),
            _ => 0.0,
        }
    }

    /// A point guaranteed to be associated with the geometry: the point itself, the middle
    /// vertex of a line, or a polygon's centroid.
    pub fn representative_point(&self) -> Option<DVec2> {
        match self {
            FeatureGeometry::Point(p) => Some(to_dvec(p.0)),
            FeatureGeometry::Line(l) => l.0.get(l.0.len() / 2).copied().map(to_dvec),
            FeatureGeometry::Polygon(p) => p
                .centroid()
                .map(|c| to_dvec(c.0))
                .or_else(|| p.exterior().0.first().copied().map(to_dvec)),
        }
    }
}
