//! Synthetic feature data so the examples run offline.
//!
//! The layout loosely resembles open countryside: a few hamlets joined by tracks, a stream,
//! a lake, woods and farmland.
use std::f64::consts::TAU;

use geo::{LineString, Point, Polygon};
use glam::DVec2;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use sarenv::features::{FeatureSource, GeoJsonFeatureSource, InMemoryFeatureSource, RawFeature};
use sarenv::geometry::{FeatureGeometry, LocalFrame, LonLat};
use tracing::info;

/// Seed used by the examples for both the synthetic features and the samplers.
pub const DEMO_SEED: u64 = 2025;

fn uniform(rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
    let u = (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
    lo + (hi - lo) * u
}

fn lonlat_ring(frame: &LocalFrame, local: &[DVec2]) -> LineString<f64> {
    let mut coords: Vec<(f64, f64)> = local
        .iter()
        .map(|p| {
            let ll = frame.unproject(*p);
            (ll.lon, ll.lat)
        })
        .collect();
    if let Some(first) = coords.first().copied() {
        coords.push(first);
    }
    LineString::from(coords)
}

fn lonlat_line(frame: &LocalFrame, local: &[DVec2]) -> FeatureGeometry {
    let coords: Vec<(f64, f64)> = local
        .iter()
        .map(|p| {
            let ll = frame.unproject(*p);
            (ll.lon, ll.lat)
        })
        .collect();
    FeatureGeometry::Line(LineString::from(coords))
}

fn rectangle(frame: &LocalFrame, center: DVec2, half: DVec2) -> FeatureGeometry {
    let corners = [
        center + DVec2::new(-half.x, -half.y),
        center + DVec2::new(half.x, -half.y),
        center + DVec2::new(half.x, half.y),
        center + DVec2::new(-half.x, half.y),
    ];
    FeatureGeometry::Polygon(Polygon::new(lonlat_ring(frame, &corners), Vec::new()))
}

fn blob(frame: &LocalFrame, center: DVec2, radius: f64, sides: usize) -> FeatureGeometry {
    let ring: Vec<DVec2> = (0..sides)
        .map(|i| center + DVec2::from_angle(TAU * i as f64 / sides as f64) * radius)
        .collect();
    FeatureGeometry::Polygon(Polygon::new(lonlat_ring(frame, &ring), Vec::new()))
}

/// Generates tagged raw features inside a circle of `radius_m` around `center`.
pub fn demo_source(center: LonLat, radius_m: f64, seed: u64) -> InMemoryFeatureSource {
    let frame = LocalFrame::new(center);
    let mut rng = StdRng::seed_from_u64(seed);
    let r = radius_m;
    let mut features = Vec::new();

    let hamlets: Vec<DVec2> = (0..4)
        .map(|_| DVec2::new(uniform(&mut rng, -0.6, 0.6), uniform(&mut rng, -0.6, 0.6)) * r)
        .collect();
    for hamlet in &hamlets {
        for _ in 0..15 {
            let offset = DVec2::new(uniform(&mut rng, -60.0, 60.0), uniform(&mut rng, -60.0, 60.0));
            let ll = frame.unproject(*hamlet + offset);
            features.push(
                RawFeature::new(FeatureGeometry::Point(Point::new(ll.lon, ll.lat)))
                    .with_tag("building", "house"),
            );
        }
    }
    for pair in hamlets.windows(2) {
        features.push(
            RawFeature::new(lonlat_line(&frame, &[pair[0], pair[1]])).with_tag("highway", "track"),
        );
    }
    features.push(
        RawFeature::new(lonlat_line(
            &frame,
            &[DVec2::new(-r, -0.2 * r), DVec2::ZERO, DVec2::new(r, 0.3 * r)],
        ))
        .with_tag("highway", "secondary"),
    );

    let phase = uniform(&mut rng, 0.0, TAU);
    let stream: Vec<DVec2> = (0..=40)
        .map(|i| {
            let x = -r + 2.0 * r * f64::from(i) / 40.0;
            DVec2::new(x, 0.25 * r * (x / r * 3.0 + phase).sin() - 0.4 * r)
        })
        .collect();
    features.push(RawFeature::new(lonlat_line(&frame, &stream)).with_tag("waterway", "stream"));

    let lake = DVec2::new(uniform(&mut rng, -0.5, 0.5), uniform(&mut rng, 0.3, 0.6)) * r;
    features.push(RawFeature::new(blob(&frame, lake, 0.08 * r, 12)).with_tag("natural", "water"));

    for (count, key, value) in [
        (6, "landuse", "forest"),
        (4, "landuse", "farmland"),
        (5, "natural", "scrub"),
        (3, "natural", "heath"),
    ] {
        for _ in 0..count {
            let center = DVec2::new(uniform(&mut rng, -0.8, 0.8), uniform(&mut rng, -0.8, 0.8)) * r;
            let half = DVec2::new(uniform(&mut rng, 0.03, 0.1), uniform(&mut rng, 0.03, 0.1)) * r;
            features.push(RawFeature::new(rectangle(&frame, center, half)).with_tag(key, value));
        }
    }

    InMemoryFeatureSource::new(features)
}

/// Uses the GeoJSON file named by the first command-line argument, or the synthetic demo
/// features around `center` when none is given.
pub fn feature_source_from_args(center: LonLat, radius_m: f64) -> Box<dyn FeatureSource> {
    match std::env::args().nth(1) {
        Some(path) => {
            info!("Reading features from '{}'.", path);
            Box::new(GeoJsonFeatureSource::new(path))
        }
        None => {
            info!("No feature file given; using synthetic demo features.");
            Box::new(demo_source(center, radius_m, DEMO_SEED))
        }
    }
}
