//! Render a small showcase scene to PNG.
//!
//! Usage: `simple_render [config.json] [output.png]`
//!
//! The optional config is a partial `RenderConfig` in JSON; missing fields keep
//! their defaults. Set `RUST_LOG=info` to watch progress.

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use anyhow::{Context, Result};
use prism_core::{AreaShape, Camera, Light, Material, Scene, Shape, TextureStore};
use prism_math::{trs_matrix, Color, DVec3};
use prism_renderer::{RenderConfig, Renderer, ToneMapping};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 400;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config: RenderConfig = match args.next() {
        Some(path) => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?
        }
        None => RenderConfig {
            aa_samples: 16,
            glossy_samples: 8,
            tone_mapping: ToneMapping::Reinhard,
            ..RenderConfig::default()
        },
    };
    let output_path = args.next().unwrap_or_else(|| "output.png".to_string());

    let scene = build_scene();

    let mut textures = TextureStore::new();
    let requests = scene.texture_requests();
    textures.preload(requests.iter().map(|(name, space)| (name.as_str(), *space)));

    let renderer = Renderer::new(&scene, &textures, config)?;
    let output = renderer.render_camera(0, WIDTH, HEIGHT)?;

    if let Some((row, time)) = output.stats.slowest_row() {
        log::info!("Slowest row {} took {:.2?}", row, time);
    }

    image::RgbaImage::from_raw(WIDTH, HEIGHT, output.image.to_rgba8())
        .context("image buffer has the wrong size")?
        .save(&output_path)
        .with_context(|| format!("writing {output_path}"))?;
    log::info!("Saved {} in {:.2?}", output_path, output.stats.elapsed);

    Ok(())
}

/// One of each shape kind on a floor, lit by a soft key light and a point fill.
fn build_scene() -> Scene {
    let mut scene = Scene::new("showcase");
    scene.settings.background_color = Color::new(0.3, 0.4, 0.6);

    let floor = Arc::new(Material::new("floor", Color::splat(0.7)));
    let red = Arc::new(Material::new("red", Color::new(0.8, 0.15, 0.1)));
    let gold = Arc::new(Material::metal("gold", Color::new(1.0, 0.8, 0.35), 0.8));
    let glass = Arc::new(Material::glass("glass", 1.5));
    let blue = Arc::new(Material::new("blue", Color::new(0.15, 0.3, 0.85)));
    let lamp = Arc::new(Material::emissive("lamp", Color::new(1.0, 0.9, 0.7), 6.0));

    scene.add_shape(Shape::polygon(
        "floor",
        vec![
            DVec3::new(-10.0, 0.0, 10.0),
            DVec3::new(10.0, 0.0, 10.0),
            DVec3::new(10.0, 0.0, -10.0),
            DVec3::new(-10.0, 0.0, -10.0),
        ],
        floor,
    ));
    scene.add_shape(Shape::sphere("glass ball", glass).with_trs(
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::ZERO,
        DVec3::ONE,
    ));
    scene.add_shape(Shape::cube("crate", red).with_trs(
        DVec3::new(-2.6, 0.7, -0.5),
        DVec3::new(0.0, 0.6, 0.0),
        DVec3::splat(0.7),
    ));
    scene.add_shape(Shape::torus("ring", 0.8, 0.25, gold).with_trs(
        DVec3::new(2.6, 0.25, 0.3),
        DVec3::ZERO,
        DVec3::ONE,
    ));
    scene.add_shape(Shape::cylinder("pillar", 0.5, 2.0, blue.clone()).with_trs(
        DVec3::new(-1.2, 1.0, -2.5),
        DVec3::new(FRAC_PI_2, 0.0, 0.0),
        DVec3::ONE,
    ));
    scene.add_shape(Shape::cone("spire", 0.6, 1.6, blue).with_trs(
        DVec3::new(1.3, 0.8, -2.5),
        DVec3::new(-FRAC_PI_2, 0.0, 0.0),
        DVec3::ONE,
    ));

    // Drifts sideways while the shutter is open.
    let start = trs_matrix(DVec3::new(-0.4, 3.2, -1.0), DVec3::ZERO, DVec3::splat(0.25));
    let end = trs_matrix(DVec3::new(0.4, 3.2, -1.0), DVec3::ZERO, DVec3::splat(0.25));
    scene.add_shape(Shape::sphere("lamp", lamp).with_motion(start, end));

    scene.add_light(
        Light::area(
            "key",
            DVec3::new(-3.0, 6.0, 4.0),
            Color::ONE,
            150.0,
            AreaShape::Rectangle,
            2.0,
            1.0,
        )
        .facing(DVec3::new(3.0, -6.0, -4.0))
        .with_samples(16),
    );
    let fill_color = Color::new(0.8, 0.85, 1.0);
    scene.add_light(Light::point("fill", DVec3::new(5.0, 3.0, 5.0), fill_color, 40.0));

    scene.add_camera(
        Camera::new()
            .looking_at(DVec3::new(0.0, 2.5, 8.0), DVec3::new(0.0, 0.8, 0.0), DVec3::Y)
            .with_lens(35.0, 36.0, 24.0)
            .with_depth_of_field(8.0, 8.0),
    );

    scene
}
