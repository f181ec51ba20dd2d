use sarenv::prelude::*;
use sarenv_examples::{feature_source_from_args, init_tracing, render_heatmap_to_png, RenderConfig};
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("--- Environment generation from a polygon ---");

    let triangle = vec![
        LonLat::new(10.285, 55.142),
        LonLat::new(10.295, 55.142),
        LonLat::new(10.290, 55.148),
        LonLat::new(10.285, 55.142),
    ];

    let source = feature_source_from_args(LonLat::new(10.29, 55.145), 1_000.0);
    let generator = DataGenerator::new(source, GeneratorConfig::default());

    // 20 m bins: finer than the exports.
    let env = generator.generate_environment_from_polygon(triangle, 20.0)?;
    info!(
        "Generated environment with area: {:.2} m² ({:.4} km²)",
        env.area_m2(),
        env.area_m2() / 1e6
    );
    info!("Number of feature types found: {}", env.feature_types().len());
    for category in env.feature_types() {
        info!("  {:<10} {} features", category, env.features_of(category).count());
    }

    match env.combined_heatmap() {
        Some(heatmap) => {
            info!("Combined heatmap shape: {:?}", heatmap.shape());
            info!(
                "Heatmap statistics - min: {:.6}, max: {:.6}",
                heatmap.min(),
                heatmap.max()
            );
            let rc = RenderConfig::new((600, 600));
            render_heatmap_to_png(heatmap, &rc, "polygon-environment.png")?;
        }
        None => warn!("The triangle holds no features; no combined heatmap."),
    }
    Ok(())
}
