use sarenv::prelude::*;
use sarenv_examples::{feature_source_from_args, init_tracing, render_heatmap_to_png, RenderConfig};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("--- Center-point export ---");

    let center = LonLat::new(139.74852584739452, 35.60677389602193);
    let output_dir = "sarenv_dataset";
    let (climate, environment_type) = (Climate::Temperate, EnvironmentType::Flat);

    let radius_m = SizeTier::XLarge.radius_km(climate, environment_type) * 1_000.0;
    let source = feature_source_from_args(center, radius_m);
    let generator = DataGenerator::new(source, GeneratorConfig::new(climate, environment_type));

    let Some(summary) =
        generator.export_dataset(center, output_dir, climate, environment_type, 30.0)
    else {
        error!("Export failed; see the log above.");
        return Ok(());
    };
    info!(
        "Exported {} features, raster {:?}, to '{}'",
        summary.feature_count,
        summary.shape,
        summary.directory.display()
    );

    info!("--- Verifying exported files ---");
    let loader = DatasetLoader::new(output_dir)?;
    for (size, km) in &loader.metadata().sizes {
        info!("  size {:<6} radius {:.1} km", size, km);
    }
    match loader.load_heatmap()? {
        Some(heatmap) => {
            info!("Loaded heatmap. Shape: {:?}, sum {:.6}", heatmap.shape(), heatmap.sum());
            let rc = RenderConfig::new((900, 900));
            render_heatmap_to_png(&heatmap, &rc, "sarenv_heatmap.png")?;
        }
        None => error!("Verification failed: no heatmap in '{}'.", output_dir),
    }
    let features = loader.load_features()?;
    info!("Loaded {} features.", features.len());
    for f in features.iter().take(5) {
        info!("  {:<10} p={:.6}", f.feature_type, f.area_probability);
    }
    Ok(())
}
