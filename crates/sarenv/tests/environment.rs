use geo::{line_string, point, polygon};
use sarenv::prelude::*;
use sarenv::surface::PROBABILITY_TOLERANCE;

fn rectangle() -> Vec<[f64; 2]> {
    vec![
        [10.280, 55.140],
        [10.300, 55.140],
        [10.300, 55.150],
        [10.280, 55.150],
        [10.280, 55.140],
    ]
}

fn source() -> InMemoryFeatureSource {
    InMemoryFeatureSource::new(vec![
        RawFeature::new(FeatureGeometry::Point(point!(x: 10.285, y: 55.143)))
            .with_tag("building", "house"),
        RawFeature::new(FeatureGeometry::Line(line_string![
            (x: 10.275, y: 55.145),
            (x: 10.305, y: 55.146),
        ]))
        .with_tag("highway", "track"),
        RawFeature::new(FeatureGeometry::Polygon(polygon![
            (x: 10.290, y: 55.147),
            (x: 10.296, y: 55.147),
            (x: 10.296, y: 55.149),
            (x: 10.290, y: 55.149),
            (x: 10.290, y: 55.147),
        ]))
        .with_tag("landuse", "forest"),
        RawFeature::new(FeatureGeometry::Point(point!(x: 10.289, y: 55.141)))
            .with_tag("amenity", "bench"),
    ])
}

fn generator() -> DataGenerator {
    DataGenerator::new(source(), GeneratorConfig::default())
}

#[test]
fn rectangle_environment_at_thirty_meters() {
    let env = generator()
        .generate_environment_from_polygon(rectangle(), 30.0)
        .unwrap();

    assert_eq!(env.features().len(), 3);
    assert_eq!(
        env.feature_types(),
        vec![
            FeatureCategory::Structure,
            FeatureCategory::Road,
            FeatureCategory::Woodland
        ]
    );
    let total: f64 = env.features().iter().map(|f| f.area_probability).sum();
    assert!((total - 1.0).abs() < PROBABILITY_TOLERANCE);

    let extent = env.region().extent();
    let expected = (
        (extent.y / 30.0).ceil() as usize,
        (extent.x / 30.0).ceil() as usize,
    );
    let combined = env.combined_heatmap().unwrap();
    assert_eq!(combined.shape(), expected);
    assert!(combined.is_normalized());
    assert!(combined.min() >= 0.0);
    for category in env.feature_types() {
        assert!(env.type_heatmap(category).unwrap().is_normalized());
    }
    assert!(env.type_heatmap(FeatureCategory::Rock).unwrap().is_zero());
}

#[test]
fn halving_the_bin_size_quadruples_the_cells() {
    let generator = generator();
    let coarse = generator
        .generate_environment_from_polygon(rectangle(), 30.0)
        .unwrap();
    let fine = generator
        .generate_environment_from_polygon(rectangle(), 15.0)
        .unwrap();

    let ratio = fine.grid().len() as f64 / coarse.grid().len() as f64;
    assert!((3.5..=4.5).contains(&ratio), "cell ratio {ratio}");
    assert!(coarse.combined_heatmap().unwrap().is_normalized());
    assert!(fine.combined_heatmap().unwrap().is_normalized());
}

#[test]
fn generation_is_idempotent() {
    let generator = generator();
    let a = generator
        .generate_environment_from_polygon(rectangle(), 30.0)
        .unwrap();
    let b = generator
        .generate_environment_from_polygon(rectangle(), 30.0)
        .unwrap();

    assert_eq!(a.features(), b.features());
    assert_eq!(a.grid(), b.grid());
    let (ca, cb) = (a.combined_heatmap().unwrap(), b.combined_heatmap().unwrap());
    for (x, y) in ca.data.iter().zip(&cb.data) {
        assert!((x - y).abs() < 1e-12);
    }
}

#[test]
fn dict_input_matches_ring_input() {
    let dict = serde_json::json!({ "type": "Polygon", "coordinates": [rectangle()] });
    let generator = generator();
    let from_dict = generator
        .generate_environment_from_polygon(dict, 30.0)
        .unwrap();
    let from_ring = generator
        .generate_environment_from_polygon(rectangle(), 30.0)
        .unwrap();
    assert_eq!(from_dict.grid(), from_ring.grid());
    assert_eq!(from_dict.features(), from_ring.features());
}

/// An environment whose whole mass sits in the north-west corner bin.
fn corner_environment() -> Environment {
    let region = RegionInput::from(rectangle()).into_region().unwrap();
    let (min, max) = region.bounds();
    let grid = BinGrid::covering(min, max, 30.0);
    let corner = region.frame().unproject(grid.index_to_world(0, 0));
    let house = Feature {
        feature_type: FeatureCategory::Structure,
        area_probability: 1.0,
        geometry: FeatureGeometry::Point(point!(x: corner.lon, y: corner.lat)),
    };
    Environment::from_features(region, vec![house], &GeneratorConfig::default()).unwrap()
}

#[test]
fn weighted_sampling_concentrates_in_the_hot_cell() {
    let env = corner_environment();
    let combined = env.combined_heatmap().unwrap();
    assert!((combined.get(0, 0) - 1.0).abs() < PROBABILITY_TOLERANCE);

    let (cell_min, cell_max) = env.grid().cell_bounds(0, 0);
    let frame = env.region().frame();
    let locations = LostPersonLocationGenerator::with_seed(&env, 7).generate_locations(100, 0.0);
    assert_eq!(locations.len(), 100);

    let eps = 1e-6;
    let inside = locations
        .iter()
        .map(|p| frame.project(*p))
        .filter(|p| {
            p.x >= cell_min.x - eps
                && p.x <= cell_max.x + eps
                && p.y >= cell_min.y - eps
                && p.y <= cell_max.y + eps
        })
        .count();
    assert!(inside > 90, "only {inside} of 100 locations in the hot cell");
}

#[test]
fn weighted_draws_stay_inside_the_region_bounds() {
    let env = generator()
        .generate_environment_from_polygon(rectangle(), 30.0)
        .unwrap();
    let (min, max) = env.region().bounds();
    let frame = env.region().frame();
    let eps = 1e-6;
    for p in LostPersonLocationGenerator::with_seed(&env, 11).generate_locations(500, 0.0) {
        let p = frame.project(p);
        assert!(p.x >= min.x - eps && p.x <= max.x + eps);
        assert!(p.y >= min.y - eps && p.y <= max.y + eps);
    }
}

#[test]
fn random_draws_cover_the_region_evenly() {
    let env = generator()
        .generate_environment_from_polygon(rectangle(), 30.0)
        .unwrap();
    let frame = env.region().frame();
    let (min, max) = env.region().bounds();
    let mid = (min + max) * 0.5;

    let locations = LostPersonLocationGenerator::with_seed(&env, 5).generate_locations(4_000, 1.0);
    let mut quadrants = [0usize; 4];
    for p in &locations {
        assert!(env.region().contains(*p));
        let p = frame.project(*p);
        let q = usize::from(p.x >= mid.x) + 2 * usize::from(p.y >= mid.y);
        quadrants[q] += 1;
    }
    for count in quadrants {
        assert!((850..=1_150).contains(&count), "quadrant counts {quadrants:?}");
    }
}

#[test]
fn empty_region_has_no_surface_but_still_samples() {
    let generator =
        DataGenerator::new(InMemoryFeatureSource::default(), GeneratorConfig::default());
    let env = generator
        .generate_environment_from_polygon(rectangle(), 30.0)
        .unwrap();
    assert!(env.features().is_empty());
    assert!(env.combined_heatmap().is_none());
    assert!(matches!(env.require_features(), Err(Error::EmptyRegion)));

    let locations = LostPersonLocationGenerator::new(&env).generate_locations(25, 0.0);
    assert_eq!(locations.len(), 25);
    assert!(locations.iter().all(|p| env.region().contains(*p)));
}
