//! Geographic coordinates, the local metric frame, and search regions.
//!
//! All metric work (areas, distances, bin sizes) happens in a [`LocalFrame`]: an
//! equirectangular projection centered on the region, accurate to well under a percent
//! for regions of a few tens of kilometers.
use glam::DVec2;

pub mod region;
pub mod shape;

pub use region::{Region, RegionInput, RegionShape};
pub use shape::FeatureGeometry;

/// Mean earth radius in meters.
pub const EARTH_MEAN_RADIUS: f64 = 6_371_008.8;

/// A WGS84 longitude/latitude pair in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Returns `true` if both components are finite and inside the WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

impl From<[f64; 2]> for LonLat {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<(f64, f64)> for LonLat {
    fn from(value: (f64, f64)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<LonLat> for [f64; 2] {
    fn from(value: LonLat) -> Self {
        [value.lon, value.lat]
    }
}

impl From<mint::Point2<f64>> for LonLat {
    fn from(value: mint::Point2<f64>) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<LonLat> for mint::Point2<f64> {
    fn from(value: LonLat) -> Self {
        mint::Point2 {
            x: value.lon,
            y: value.lat,
        }
    }
}

impl From<geo::Coord<f64>> for LonLat {
    fn from(value: geo::Coord<f64>) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<LonLat> for geo::Coord<f64> {
    fn from(value: LonLat) -> Self {
        geo::Coord {
            x: value.lon,
            y: value.lat,
        }
    }
}

/// Equirectangular projection between lon/lat degrees and local meters.
///
/// `x` grows east and `y` grows north; the origin maps to `(0, 0)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalFrame {
    origin: LonLat,
    meters_per_deg_lon: f64,
    meters_per_deg_lat: f64,
}

impl LocalFrame {
    pub fn new(origin: LonLat) -> Self {
        let meters_per_deg_lat = EARTH_MEAN_RADIUS * std::f64::consts::PI / 180.0;
        // Keep a floor on the scale so frames near the poles stay invertible.
        let cos_lat = origin.lat.to_radians().cos().max(1e-6);
        Self {
            origin,
            meters_per_deg_lon: meters_per_deg_lat * cos_lat,
            meters_per_deg_lat,
        }
    }

    pub fn origin(&self) -> LonLat {
        self.origin
    }

    #[inline]
    pub fn project(&self, p: LonLat) -> DVec2 {
        DVec2::new(
            (p.lon - self.origin.lon) * self.meters_per_deg_lon,
            (p.lat - self.origin.lat) * self.meters_per_deg_lat,
        )
    }

    #[inline]
    pub fn unproject(&self, p: DVec2) -> LonLat {
        LonLat::new(
            self.origin.lon + p.x / self.meters_per_deg_lon,
            self.origin.lat + p.y / self.meters_per_deg_lat,
        )
    }

    /// Projects a lon/lat coordinate stored as `geo::Coord` (`x` = lon, `y` = lat).
    #[inline]
    pub fn project_coord(&self, c: geo::Coord<f64>) -> geo::Coord<f64> {
        let p = self.project(LonLat::from(c));
        geo::Coord { x: p.x, y: p.y }
    }
}

/// Distance in meters from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    p.distance(closest_on_segment(p, a, b))
}

/// The point of segment `a`-`b` nearest to `p`.
pub fn closest_on_segment(p: DVec2, a: DVec2, b: DVec2) -> DVec2 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f64::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

/// Converts a `geo::Coord` in local meters to a `DVec2`.
#[inline]
pub(crate) fn to_dvec(c: geo::Coord<f64>) -> DVec2 {
    DVec2::new(c.x, c.y)
}
