#![forbid(unsafe_code)]

mod demo;
mod rendering;

pub use demo::{demo_source, feature_source_from_args, DEMO_SEED};
pub use rendering::{
    init_tracing, render_heatmap_to_png, render_locations_to_png, RenderConfig,
};
