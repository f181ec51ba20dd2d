//! Search regions and the boundary normalization of region inputs.
//!
//! A [`Region`] is either an explicit polygon or a circle around a center point. Every
//! accepted external representation goes through [`RegionInput::into_region`] once, so
//! the rest of the crate only ever sees validated regions.
use geo::line_intersection::{line_intersection, LineIntersection};
use geo::{Area, Contains, Coord, Intersects, Line, LineString, MapCoords, Point, Polygon};
use glam::DVec2;
use serde_json::Value;

use super::{
    closest_on_segment, distance_to_segment, to_dvec, FeatureGeometry, LocalFrame, LonLat,
};
use crate::dataset::geojson;
use crate::error::{Error, Result};

/// The shape a region was built from. Polygon coordinates are lon/lat.
#[derive(Clone, Debug, PartialEq)]
pub enum RegionShape {
    Polygon(Polygon<f64>),
    Circle { center: LonLat, radius_m: f64 },
}

/// An immutable, validated search area with its local metric frame.
#[derive(Clone, Debug)]
pub struct Region {
    shape: RegionShape,
    frame: LocalFrame,
    local: Option<Polygon<f64>>,
    min: DVec2,
    max: DVec2,
}

impl Region {
    /// Builds a polygon region from a closed ring of lon/lat vertices.
    pub fn polygon(ring: Vec<LonLat>) -> Result<Self> {
        let ring = validate_ring(ring)?;

        let (mut lo, mut hi) = (ring[0], ring[0]);
        for p in &ring {
            lo.lon = lo.lon.min(p.lon);
            lo.lat = lo.lat.min(p.lat);
            hi.lon = hi.lon.max(p.lon);
            hi.lat = hi.lat.max(p.lat);
        }
        let frame = LocalFrame::new(LonLat::new(
            (lo.lon + hi.lon) * 0.5,
            (lo.lat + hi.lat) * 0.5,
        ));

        let exterior: LineString<f64> = ring.iter().copied().map(Coord::from).collect();
        let polygon = Polygon::new(exterior, Vec::new());
        let local = polygon.map_coords(|c| frame.project_coord(c));
        if local.unsigned_area() <= f64::EPSILON {
            return Err(Error::InvalidGeometry("polygon has zero area".into()));
        }

        let min = frame.project(lo);
        let max = frame.project(hi);
        Ok(Self {
            shape: RegionShape::Polygon(polygon),
            frame,
            local: Some(local),
            min,
            max,
        })
    }

    /// Builds a circular region of `radius_m` meters around `center`.
    pub fn circle(center: LonLat, radius_m: f64) -> Result<Self> {
        if !center.is_valid() {
            return Err(Error::InvalidGeometry(format!(
                "center {center:?} is not a valid lon/lat"
            )));
        }
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "radius must be finite and > 0, got {radius_m}"
            )));
        }
        Ok(Self {
            shape: RegionShape::Circle { center, radius_m },
            frame: LocalFrame::new(center),
            local: None,
            min: DVec2::splat(-radius_m),
            max: DVec2::splat(radius_m),
        })
    }

    pub fn shape(&self) -> &RegionShape {
        &self.shape
    }

    pub fn frame(&self) -> &LocalFrame {
        &self.frame
    }

    /// Bounding box `(min, max)` in local meters.
    pub fn bounds(&self) -> (DVec2, DVec2) {
        (self.min, self.max)
    }

    /// Bounding box size in meters.
    pub fn extent(&self) -> DVec2 {
        self.max - self.min
    }

    /// Bounding box as `(south_west, north_east)` lon/lat corners.
    pub fn bounds_lonlat(&self) -> (LonLat, LonLat) {
        (self.frame.unproject(self.min), self.frame.unproject(self.max))
    }

    /// Area in square meters.
    pub fn area_m2(&self) -> f64 {
        match (&self.shape, &self.local) {
            (_, Some(local)) => local.unsigned_area(),
            (RegionShape::Circle { radius_m, .. }, None) => {
                std::f64::consts::PI * radius_m * radius_m
            }
            (RegionShape::Polygon(_), None) => 0.0,
        }
    }

    /// The polygon in local meters, if this is a polygon region.
    pub fn local_polygon(&self) -> Option<&Polygon<f64>> {
        self.local.as_ref()
    }

    /// Tests a local-meter position against the region interior.
    pub fn contains_local(&self, p: DVec2) -> bool {
        match (&self.shape, &self.local) {
            (_, Some(local)) => local.contains(&Point::new(p.x, p.y)),
            (RegionShape::Circle { radius_m, .. }, None) => p.length() <= *radius_m,
            (RegionShape::Polygon(_), None) => false,
        }
    }

    pub fn contains(&self, p: LonLat) -> bool {
        self.contains_local(self.frame.project(p))
    }

    /// Returns `true` if any part of a lon/lat geometry touches the region.
    pub fn intersects(&self, geometry: &FeatureGeometry) -> bool {
        self.intersects_local(&geometry.project(&self.frame))
    }

    /// Same as [`Region::intersects`] for geometry already projected into this region's frame.
    pub fn intersects_local(&self, geometry: &FeatureGeometry) -> bool {
        match (&self.shape, &self.local) {
            (_, Some(local)) => match geometry {
                FeatureGeometry::Point(p) => local.intersects(p),
                FeatureGeometry::Line(l) => local.intersects(l),
                FeatureGeometry::Polygon(p) => local.intersects(p),
            },
            (RegionShape::Circle { radius_m, .. }, None) => {
                let r = *radius_m;
                match geometry {
                    FeatureGeometry::Point(p) => to_dvec(p.0).length() <= r,
                    FeatureGeometry::Line(l) => ring_within(l, r),
                    FeatureGeometry::Polygon(p) => {
                        p.contains(&Point::new(0.0, 0.0)) || ring_within(p.exterior(), r)
                    }
                }
            }
            (RegionShape::Polygon(_), None) => false,
        }
    }

    /// Like [`Region::contains_local`], but boundary points count as inside.
    pub fn touches_local(&self, p: DVec2) -> bool {
        match (&self.shape, &self.local) {
            (_, Some(local)) => local.intersects(&Point::new(p.x, p.y)),
            (RegionShape::Circle { radius_m, .. }, None) => p.length() <= *radius_m,
            (RegionShape::Polygon(_), None) => false,
        }
    }

    /// A local-meter point shared by the region and a projected geometry, or `None` when
    /// they are disjoint.
    ///
    /// Prefers the geometry's representative point, then its vertices, then a region vertex
    /// (or the circle center) covered by a polygon, then a boundary crossing.
    pub fn touch_point_local(&self, geometry: &FeatureGeometry) -> Option<DVec2> {
        if let Some(p) = geometry
            .representative_point()
            .filter(|p| self.touches_local(*p))
        {
            return Some(p);
        }

        let rings: Vec<&LineString<f64>> = match geometry {
            FeatureGeometry::Point(p) => {
                let p = to_dvec(p.0);
                return self.touches_local(p).then_some(p);
            }
            FeatureGeometry::Line(l) => vec![l],
            FeatureGeometry::Polygon(p) => std::iter::once(p.exterior())
                .chain(p.interiors())
                .collect(),
        };
        if let Some(v) = rings
            .iter()
            .flat_map(|ring| ring.0.iter())
            .map(|c| to_dvec(*c))
            .find(|p| self.touches_local(*p))
        {
            return Some(v);
        }

        if let FeatureGeometry::Polygon(polygon) = geometry {
            let covered = |c: &Coord<f64>| polygon.intersects(&Point::from(*c));
            let inner = match &self.local {
                Some(local) => local.exterior().0.iter().find(|c| covered(*c)).copied(),
                None => Some(Coord { x: 0.0, y: 0.0 }).filter(covered),
            };
            if let Some(c) = inner {
                return Some(to_dvec(c));
            }
        }

        rings
            .iter()
            .flat_map(|ring| ring.lines())
            .find_map(|seg| self.boundary_crossing(seg))
    }

    /// Where a local-meter segment meets the region boundary.
    fn boundary_crossing(&self, seg: Line<f64>) -> Option<DVec2> {
        match (&self.shape, &self.local) {
            (_, Some(local)) => local
                .exterior()
                .lines()
                .chain(local.interiors().iter().flat_map(|ring| ring.lines()))
                .find_map(|edge| match line_intersection(seg, edge)? {
                    LineIntersection::SinglePoint { intersection, .. } => {
                        Some(to_dvec(intersection))
                    }
                    LineIntersection::Collinear { intersection } => {
                        Some(to_dvec(intersection.start))
                    }
                }),
            (RegionShape::Circle { radius_m, .. }, None) => {
                let p = closest_on_segment(DVec2::ZERO, to_dvec(seg.start), to_dvec(seg.end));
                (p.length() <= *radius_m).then_some(p)
            }
            (RegionShape::Polygon(_), None) => None,
        }
    }
}

/// Whether any segment of `line` comes within `r` of the local origin.
fn ring_within(line: &LineString<f64>, r: f64) -> bool {
    if line.0.len() == 1 {
        return to_dvec(line.0[0]).length() <= r;
    }
    line.lines().any(|seg| {
        distance_to_segment(DVec2::ZERO, to_dvec(seg.start), to_dvec(seg.end)) <= r
    })
}

/// Checks that a ring is closed, has at least three distinct vertices, uses valid lon/lat
/// coordinates and does not cross itself. Consecutive duplicate vertices are collapsed.
fn validate_ring(ring: Vec<LonLat>) -> Result<Vec<LonLat>> {
    if let Some(bad) = ring.iter().find(|p| !p.is_valid()) {
        return Err(Error::InvalidGeometry(format!(
            "vertex {bad:?} is not a valid lon/lat"
        )));
    }
    if ring.len() < 4 {
        return Err(Error::InvalidGeometry(format!(
            "ring needs at least 4 positions, got {}",
            ring.len()
        )));
    }
    if ring.first() != ring.last() {
        return Err(Error::InvalidGeometry("ring is not closed".into()));
    }

    let mut ring = ring;
    ring.dedup();
    // `dedup` keeps the closing vertex because it differs from its predecessor.
    let edges = ring.len() - 1;
    if edges < 3 {
        return Err(Error::InvalidGeometry(
            "ring needs at least 3 distinct vertices".into(),
        ));
    }

    let segment = |i: usize| Line::new(Coord::from(ring[i]), Coord::from(ring[i + 1]));
    for i in 0..edges {
        for j in (i + 2)..edges {
            if i == 0 && j == edges - 1 {
                continue;
            }
            if segment(i).intersects(&segment(j)) {
                return Err(Error::InvalidGeometry(format!(
                    "ring self-intersects between edges {i} and {j}"
                )));
            }
        }
    }
    Ok(ring)
}

/// Any representation accepted as a region at the public boundary.
#[derive(Clone, Debug)]
pub enum RegionInput {
    /// Closed ring of lon/lat vertices.
    Ring(Vec<LonLat>),
    /// GeoJSON-like `{"type": "Polygon", "coordinates": [[...]]}` value, optionally
    /// wrapped in a `Feature`.
    GeoJson(Value),
    /// Center point and radius in meters.
    Circle { center: LonLat, radius_m: f64 },
}

impl RegionInput {
    /// Normalizes the input into a validated [`Region`].
    pub fn into_region(self) -> Result<Region> {
        match self {
            RegionInput::Ring(ring) => Region::polygon(ring),
            RegionInput::GeoJson(value) => Region::polygon(ring_from_geojson(&value)?),
            RegionInput::Circle { center, radius_m } => Region::circle(center, radius_m),
        }
    }
}

fn ring_from_geojson(value: &Value) -> Result<Vec<LonLat>> {
    let geometry = match value.get("type").and_then(Value::as_str) {
        Some("Feature") => value
            .get("geometry")
            .ok_or_else(|| Error::InvalidGeometry("feature has no geometry".into()))?,
        Some("Polygon") => value,
        Some(other) => {
            return Err(Error::InvalidGeometry(format!(
                "expected a Polygon, got '{other}'"
            )))
        }
        None => return Err(Error::InvalidGeometry("missing geometry type".into())),
    };
    if geometry.get("type").and_then(Value::as_str) != Some("Polygon") {
        return Err(Error::InvalidGeometry("feature geometry is not a Polygon".into()));
    }

    let rings = geometry
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::InvalidGeometry("polygon has no coordinates".into()))?;
    match rings.as_slice() {
        [exterior] => {
            geojson::positions(exterior).map_err(|e| Error::InvalidGeometry(e.to_string()))
        }
        [] => Err(Error::InvalidGeometry("polygon has no rings".into())),
        _ => Err(Error::InvalidGeometry("polygon holes are not supported".into())),
    }
}

impl From<Vec<LonLat>> for RegionInput {
    fn from(value: Vec<LonLat>) -> Self {
        RegionInput::Ring(value)
    }
}

impl From<Vec<[f64; 2]>> for RegionInput {
    fn from(value: Vec<[f64; 2]>) -> Self {
        RegionInput::Ring(value.into_iter().map(LonLat::from).collect())
    }
}

impl From<&[[f64; 2]]> for RegionInput {
    fn from(value: &[[f64; 2]]) -> Self {
        RegionInput::Ring(value.iter().copied().map(LonLat::from).collect())
    }
}

impl From<Value> for RegionInput {
    fn from(value: Value) -> Self {
        RegionInput::GeoJson(value)
    }
}

/// A lon/lat `geo::Polygon`; interior rings are ignored.
impl From<Polygon<f64>> for RegionInput {
    fn from(value: Polygon<f64>) -> Self {
        RegionInput::Ring(value.exterior().coords().copied().map(LonLat::from).collect())
    }
}
