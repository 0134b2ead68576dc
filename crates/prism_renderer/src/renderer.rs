//! Parallel image renderer.
//!
//! Rows are split across a rayon pool. Each row seeds its own `StdRng` from the
//! configured seed and its index, so an image is reproducible for a given seed
//! no matter how rows land on threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use prism_core::{Camera, Scene, SceneError, TextureSource};
use prism_math::Color;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;

use crate::bvh::Bvh;
use crate::config::{ConfigError, RenderConfig};
use crate::integrator::Integrator;
use crate::sampling::{gen_f64, unit_square};

/// Errors raised while setting up a render. Tracing itself never fails.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid render config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Image buffer of linear or post-processed colors, row 0 at the top.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    /// 8-bit RGBA bytes, channels clamped to [0, 1].
    ///
    /// No gamma is applied here; the renderer already post-processed the pixels.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for color in &self.pixels {
            bytes.extend_from_slice(&[to_byte(color.x), to_byte(color.y), to_byte(color.z), 255]);
        }
        bytes
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

#[inline]
fn to_byte(channel: f64) -> u8 {
    (255.0 * channel.clamp(0.0, 1.0)).round() as u8
}

/// Timing gathered during one render.
#[derive(Clone, Debug, Default)]
pub struct RenderStats {
    pub elapsed: Duration,
    /// Wall time per row, indexed by row
    pub row_times: Vec<Duration>,
    pub samples_per_pixel: u32,
}

impl RenderStats {
    /// Index and duration of the most expensive row.
    pub fn slowest_row(&self) -> Option<(usize, Duration)> {
        self.row_times.iter().copied().enumerate().max_by_key(|(_, time)| *time)
    }
}

pub struct RenderOutput {
    pub image: ImageBuffer,
    pub stats: RenderStats,
}

/// Renders a scene with a fixed configuration.
///
/// Construction validates the config and builds the BVH once; every render
/// afterwards shares both read-only.
pub struct Renderer<'s> {
    scene: &'s Scene,
    textures: &'s dyn TextureSource,
    config: RenderConfig,
    bvh: Bvh,
    pool: Option<rayon::ThreadPool>,
}

impl<'s> Renderer<'s> {
    pub fn new(
        scene: &'s Scene,
        textures: &'s dyn TextureSource,
        config: RenderConfig,
    ) -> Result<Self, RenderError> {
        config.validate()?;

        let pool = if config.threads > 0 {
            Some(rayon::ThreadPoolBuilder::new().num_threads(config.threads).build()?)
        } else {
            None
        };

        let bvh = if config.use_bvh {
            Bvh::build(&scene.shapes)
        } else {
            log::info!("BVH disabled, testing all {} shapes per ray", scene.shapes.len());
            Bvh::default()
        };

        Ok(Self {
            scene,
            textures,
            config,
            bvh,
            pool,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// Integrator over this renderer's scene, for tracing individual rays.
    pub fn integrator(&self) -> Integrator<'_> {
        Integrator::new(self.scene, &self.bvh, self.textures, &self.config)
    }

    /// Render through the scene camera at `index`.
    pub fn render_camera(
        &self,
        index: usize,
        width: u32,
        height: u32,
    ) -> Result<RenderOutput, RenderError> {
        let camera = self.scene.camera(index)?;
        Ok(self.render(camera, width, height))
    }

    /// Render a `width x height` image through `camera`.
    pub fn render(&self, camera: &Camera, width: u32, height: u32) -> RenderOutput {
        match &self.pool {
            Some(pool) => pool.install(|| self.render_rows(camera, width, height)),
            None => self.render_rows(camera, width, height),
        }
    }

    fn render_rows(&self, camera: &Camera, width: u32, height: u32) -> RenderOutput {
        let start = Instant::now();
        let mut image = ImageBuffer::new(width, height);

        log::info!(
            "Rendering '{}' at {}x{}, {} spp, {} threads",
            self.scene.name,
            width,
            height,
            self.config.aa_samples,
            rayon::current_num_threads()
        );

        if width == 0 || height == 0 {
            return RenderOutput {
                image,
                stats: RenderStats {
                    samples_per_pixel: self.config.aa_samples,
                    ..RenderStats::default()
                },
            };
        }

        let integrator = self.integrator();
        let rows_done = AtomicUsize::new(0);
        let progress_step = (height as usize / 10).max(1);

        let row_times: Vec<Duration> = image
            .pixels
            .par_chunks_mut(width as usize)
            .enumerate()
            .map(|(y, row)| {
                let row_start = Instant::now();
                let mut rng = StdRng::seed_from_u64(row_seed(self.config.seed, y as u64));

                for (x, pixel) in row.iter_mut().enumerate() {
                    let (px, py) = (x as u32, y as u32);
                    let color =
                        self.render_pixel(&integrator, camera, px, py, width, height, &mut rng);
                    *pixel = self.config.post_process(color);
                }

                let done = rows_done.fetch_add(1, Ordering::Relaxed) + 1;
                if done % progress_step == 0 || done == height as usize {
                    let percent = 100.0 * done as f64 / height as f64;
                    log::info!("Rendered {}/{} rows ({:.0}%)", done, height, percent);
                }
                row_start.elapsed()
            })
            .collect();

        let elapsed = start.elapsed();
        log::info!("Render finished in {:.2?}", elapsed);

        RenderOutput {
            image,
            stats: RenderStats {
                elapsed,
                row_times,
                samples_per_pixel: self.config.aa_samples,
            },
        }
    }

    /// Average of `aa_samples` jittered primary rays through pixel (x, y).
    #[allow(clippy::too_many_arguments)]
    fn render_pixel(
        &self,
        integrator: &Integrator<'_>,
        camera: &Camera,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        rng: &mut dyn RngCore,
    ) -> Color {
        let mut sum = Color::ZERO;
        for _ in 0..self.config.aa_samples {
            let jitter = unit_square(rng);
            let time = if self.config.enable_motion_blur { gen_f64(rng) } else { 0.0 };
            let lens = unit_square(rng);
            let (px, py) = (x as f64 + jitter.x, y as f64 + jitter.y);
            let ray = camera.get_ray(px, py, width, height, time, lens);
            sum += integrator.trace(&ray, 0, rng);
        }
        sum / self.config.aa_samples as f64
    }
}

/// Mix the base seed and row index into an independent stream seed.
fn row_seed(seed: u64, row: u64) -> u64 {
    // splitmix64 finalizer
    let mut z = seed ^ row.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
