use std::path::Path;

use anyhow::Context;
use glam::DVec2;
use image::{Rgb, RgbImage};
use sarenv::prelude::*;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Installs a formatting subscriber at `INFO`. Safe to call more than once.
pub fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Image size and colors used by the PNG renderers.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub image_size: (u32, u32),
    pub background: [u8; 3],
    pub point_color: [u8; 3],
    pub point_radius: i64,
}

impl RenderConfig {
    pub fn new(image_size: (u32, u32)) -> Self {
        Self {
            image_size,
            background: [26, 26, 26],
            point_color: [80, 200, 255],
            point_radius: 4,
        }
    }

    pub fn with_background(mut self, rgb: [u8; 3]) -> Self {
        self.background = rgb;
        self
    }

    pub fn with_point_style(mut self, rgb: [u8; 3], radius: i64) -> Self {
        self.point_color = rgb;
        self.point_radius = radius;
        self
    }
}

/// Black, red, yellow, white.
fn hot(t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let c = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    [c(3.0 * t), c(3.0 * t - 1.0), c(3.0 * t - 2.0)]
}

fn paint_heatmap(image: &mut RgbImage, heatmap: &Heatmap) {
    let (w, h) = image.dimensions();
    let max = heatmap.max();
    if max <= 0.0 {
        return;
    }
    let (cols, rows) = (heatmap.grid.width as u64, heatmap.grid.height as u64);
    for (px, py, pixel) in image.enumerate_pixels_mut() {
        let ix = u64::from(px) * cols / u64::from(w);
        let iy = u64::from(py) * rows / u64::from(h);
        let v = heatmap.get(ix as isize, iy as isize) / max;
        if v > 0.0 {
            // sqrt keeps faint cells visible next to dense ones.
            *pixel = Rgb(hot(v.sqrt()));
        }
    }
}

fn draw_disc(image: &mut RgbImage, cx: i64, cy: i64, radius: i64, rgb: [u8; 3]) {
    let (w, h) = (i64::from(image.width()), i64::from(image.height()));
    for y in (cy - radius).max(0)..=(cy + radius).min(h - 1) {
        for x in (cx - radius).max(0)..=(cx + radius).min(w - 1) {
            let (dx, dy) = (x - cx, y - cy);
            if dx * dx + dy * dy <= radius * radius {
                image.put_pixel(x as u32, y as u32, Rgb(rgb));
            }
        }
    }
}

fn save(image: &RgbImage, path: &Path) -> anyhow::Result<()> {
    image
        .save(path)
        .with_context(|| format!("writing '{}'", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Renders a probability surface with the `hot` color ramp, north up.
pub fn render_heatmap_to_png(
    heatmap: &Heatmap,
    rc: &RenderConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let (w, h) = rc.image_size;
    let mut image = RgbImage::from_pixel(w, h, Rgb(rc.background));
    paint_heatmap(&mut image, heatmap);
    save(&image, path.as_ref())
}

/// Renders lon/lat locations over the environment's combined surface.
pub fn render_locations_to_png(
    environment: &Environment,
    locations: &[LonLat],
    rc: &RenderConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let (w, h) = rc.image_size;
    let mut image = RgbImage::from_pixel(w, h, Rgb(rc.background));
    if let Some(heatmap) = environment.combined_heatmap() {
        paint_heatmap(&mut image, heatmap);
    }

    let (min, max) = environment.grid().bounds();
    let span = (max - min).max(DVec2::splat(f64::EPSILON));
    let frame = environment.region().frame();
    for location in locations {
        let p = frame.project(*location);
        let x = (p.x - min.x) / span.x * f64::from(w);
        let y = (max.y - p.y) / span.y * f64::from(h);
        draw_disc(
            &mut image,
            x.floor() as i64,
            y.floor() as i64,
            rc.point_radius,
            rc.point_color,
        );
    }
    save(&image, path.as_ref())
}
