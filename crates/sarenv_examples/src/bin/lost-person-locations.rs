use anyhow::Context;
use sarenv::prelude::*;
use sarenv_examples::{init_tracing, render_locations_to_png, RenderConfig, DEMO_SEED};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("--- Lost person location generation ---");

    let dataset_dir = "sarenv_dataset";
    let size = SizeTier::Medium;
    let count = 100;

    info!("Loading data for size: '{}'", size);
    let loader = DatasetLoader::new(dataset_dir).with_context(|| {
        format!("opening '{dataset_dir}'; run the center-export example first")
    })?;
    let env = loader.load_environment(size)?;
    info!(
        "Loaded {} features over {:.2} km².",
        env.features().len(),
        env.area_m2() / 1e6
    );

    let mut generator = LostPersonLocationGenerator::with_seed(&env, DEMO_SEED);
    info!("Generating {} lost person locations...", count);
    let locations = generator.generate_locations(count, 0.0);
    for p in locations.iter().take(5) {
        info!("  ({:.6}, {:.6})", p.lon, p.lat);
    }

    let rc = RenderConfig::new((900, 900)).with_point_style([80, 200, 255], 5);
    render_locations_to_png(&env, &locations, &rc, "survivor_locations.png")?;
    Ok(())
}
