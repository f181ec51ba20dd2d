use anyhow::Context;
use sarenv::prelude::*;
use sarenv_examples::{feature_source_from_args, init_tracing, render_heatmap_to_png, RenderConfig};
use serde_json::json;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("--- Polygon export ---");

    // Rectangle around Svanninge Bakker, Denmark (lon, lat).
    let ring = vec![
        [10.280, 55.140],
        [10.300, 55.140],
        [10.300, 55.150],
        [10.280, 55.150],
        [10.280, 55.140],
    ];
    // The same area as a GeoJSON-like value.
    let polygon_dict = json!({ "type": "Polygon", "coordinates": [ring] });

    let source = feature_source_from_args(LonLat::new(10.29, 55.145), 1_000.0);
    let generator = DataGenerator::new(source, GeneratorConfig::default());

    let outputs = [
        ("sarenv_dataset_polygon", RegionInput::from(ring.clone())),
        ("sarenv_dataset_polygon_dict", RegionInput::from(polygon_dict)),
    ];
    for (dir, polygon) in outputs {
        info!("Exporting '{}'", dir);
        let summary = generator.export_dataset_from_polygon(
            polygon,
            dir,
            Climate::Temperate,
            EnvironmentType::Flat,
            30.0,
        );
        if summary.is_none() {
            error!("Export to '{}' failed.", dir);
        }
    }

    info!("--- Verifying exported files ---");
    for dir in ["sarenv_dataset_polygon", "sarenv_dataset_polygon_dict"] {
        if let Err(e) = verify(dir) {
            error!("Verification of '{}' failed: {:#}", dir, e);
        }
    }
    Ok(())
}

fn verify(dir: &str) -> anyhow::Result<()> {
    let loader = DatasetLoader::new(dir).with_context(|| format!("opening '{dir}'"))?;

    match loader.load_heatmap()? {
        Some(heatmap) => {
            info!("Loaded heatmap from '{}'. Shape: {:?}", dir, heatmap.shape());
            info!("Heatmap sum (should be ~1.0): {:.6}", heatmap.sum());
            let rc = RenderConfig::new((800, 800));
            render_heatmap_to_png(&heatmap, &rc, format!("{dir}.png"))?;
        }
        None => error!("'{}' has no heatmap.", dir),
    }

    let features = loader.load_features()?;
    info!("Loaded features from '{}'. Found {} features.", dir, features.len());
    for f in features.iter().take(5) {
        info!(
            "  {:<10} {:<10} p={:.6}",
            f.feature_type,
            f.geometry.type_name(),
            f.area_probability
        );
    }
    let total: f64 = features.iter().map(|f| f.area_probability).sum();
    info!("Total area probability sum: {:.6}", total);
    Ok(())
}
