//! Texture loading and lookup for materials.
//!
//! Textures are loaded up front into a [`TextureStore`] and read without locks
//! while rendering. The renderer only sees the [`TextureSource`] trait.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use prism_math::Color;
use thiserror::Error;

/// Returned by lookups of textures that were never loaded.
pub const MISSING_TEXTURE_COLOR: Color = Color::new(1.0, 0.0, 1.0);

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture: {0}")]
    LoadError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Unsupported texture format: {0}")]
    UnsupportedFormat(String),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// Read-only texture lookup used during shading.
pub trait TextureSource: Send + Sync {
    /// True if `name` resolves to a loaded texture.
    fn has(&self, name: &str) -> bool;

    /// Bilinear lookup at `(u, v)`, with v = 0 at the bottom of the image.
    ///
    /// Unknown names return [`MISSING_TEXTURE_COLOR`].
    fn sample(&self, name: &str, u: f64, v: f64) -> Color;
}

/// How stored bytes map to linear values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    /// Color images, decoded from sRGB.
    Srgb,
    /// Data images such as normal and height maps, used as-is.
    Linear,
}

/// A loaded texture with pixel data.
///
/// Stores pixels in linear RGB(A) float format for rendering.
#[derive(Clone, Debug)]
pub struct Texture {
    pub width: u32,
    pub height: u32,

    /// Stored as [R, G, B, A] per pixel, row-major from the top row
    pub pixels: Vec<[f32; 4]>,

    /// Original file path (for debugging)
    pub path: String,
}

impl Texture {
    /// Create a new texture from pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 4]>, path: impl Into<String>) -> Self {
        Self {
            width,
            height,
            pixels,
            path: path.into(),
        }
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(color: Color) -> Self {
        Self::new(
            1,
            1,
            vec![[color.x as f32, color.y as f32, color.z as f32, 1.0]],
            "<solid>",
        )
    }

    /// Bilinear sample at UV coordinates, clamped to the image edges.
    ///
    /// UVs outside [0, 1] are clamped, and v is flipped so v = 0 is the bottom row.
    pub fn sample(&self, u: f64, v: f64) -> Color {
        if self.width == 0 || self.height == 0 {
            return MISSING_TEXTURE_COLOR;
        }

        let u = u.clamp(0.0, 1.0);
        let v = 1.0 - v.clamp(0.0, 1.0);

        let x = u * self.width as f64 - 0.5;
        let y = v * self.height as f64 - 0.5;
        let fx = x - x.floor();
        let fy = y - y.floor();

        let max_x = self.width as i64 - 1;
        let max_y = self.height as i64 - 1;
        let x0 = (x.floor() as i64).clamp(0, max_x) as u32;
        let y0 = (y.floor() as i64).clamp(0, max_y) as u32;
        let x1 = (x.floor() as i64 + 1).clamp(0, max_x) as u32;
        let y1 = (y.floor() as i64 + 1).clamp(0, max_y) as u32;

        let top = self.pixel(x0, y0).lerp(self.pixel(x1, y0), fx);
        let bottom = self.pixel(x0, y1).lerp(self.pixel(x1, y1), fx);
        top.lerp(bottom, fy)
    }

    fn pixel(&self, x: u32, y: u32) -> Color {
        let idx = (y * self.width + x) as usize;
        self.pixels
            .get(idx)
            .map(|p| Color::new(p[0] as f64, p[1] as f64, p[2] as f64))
            .unwrap_or(Color::ZERO)
    }

    /// Get total size in bytes (approximate).
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<[f32; 4]>()
    }
}

/// Textures keyed by the name materials refer to them with.
///
/// Fill it before rendering; lookups never load from disk.
pub struct TextureStore {
    textures: HashMap<String, Arc<Texture>>,

    /// Base directory for resolving relative paths
    base_dir: Option<PathBuf>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: None,
        }
    }

    /// Create a store that resolves relative names against `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Register an already decoded texture under `name`.
    pub fn insert(&mut self, name: impl Into<String>, texture: Texture) {
        self.textures.insert(name.into(), Arc::new(texture));
    }

    /// Load a texture from file unless it is already present.
    pub fn load(&mut self, name: &str, color_space: ColorSpace) -> TextureResult<Arc<Texture>> {
        if let Some(texture) = self.textures.get(name) {
            return Ok(texture.clone());
        }

        let full_path = self.resolve_path(name);
        let texture = Arc::new(load_texture_file(&full_path, color_space)?);
        self.textures.insert(name.to_string(), texture.clone());

        log::debug!(
            "Loaded texture: {} ({}x{}, {:.1} KB)",
            name,
            texture.width,
            texture.height,
            texture.size_bytes() as f64 / 1024.0
        );

        Ok(texture)
    }

    /// Load every named texture, logging and skipping the ones that fail.
    ///
    /// Returns how many are available afterwards. Missing ones sample as
    /// [`MISSING_TEXTURE_COLOR`].
    pub fn preload<'a, I>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, ColorSpace)>,
    {
        let mut available = 0;
        for (name, color_space) in names {
            match self.load(name, color_space) {
                Ok(_) => available += 1,
                Err(err) => log::warn!("Texture '{}' unavailable: {}", name, err),
            }
        }
        log::info!(
            "Texture store holds {} textures ({:.1} KB)",
            self.len(),
            self.total_size_bytes() as f64 / 1024.0
        );
        available
    }

    /// Get a texture without loading.
    pub fn get(&self, name: &str) -> Option<Arc<Texture>> {
        self.textures.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Get total memory usage of stored textures.
    pub fn total_size_bytes(&self) -> usize {
        self.textures.values().map(|t| t.size_bytes()).sum()
    }

    /// Resolve a path relative to the base directory.
    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);

        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl Default for TextureStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureSource for TextureStore {
    fn has(&self, name: &str) -> bool {
        self.textures.contains_key(name)
    }

    fn sample(&self, name: &str, u: f64, v: f64) -> Color {
        match self.textures.get(name) {
            Some(texture) => texture.sample(u, v),
            None => MISSING_TEXTURE_COLOR,
        }
    }
}

/// Load a texture from a file path.
fn load_texture_file(path: &Path, color_space: ColorSpace) -> TextureResult<Texture> {
    if !path.exists() {
        return Err(TextureError::LoadError(format!("{} does not exist", path.display())));
    }

    let img = image::open(path)?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(TextureError::UnsupportedFormat(format!("{} has no pixels", path.display())));
    }

    let decode = |value: u8| match color_space {
        ColorSpace::Srgb => srgb_to_linear(value),
        ColorSpace::Linear => value as f32 / 255.0,
    };

    let pixels: Vec<[f32; 4]> = rgba
        .pixels()
        .map(|p| [decode(p[0]), decode(p[1]), decode(p[2]), p[3] as f32 / 255.0])
        .collect();

    Ok(Texture::new(width, height, pixels, path.to_string_lossy()))
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x2 texture: top row red, green; bottom row blue, white.
    fn checker() -> Texture {
        Texture::new(
            2,
            2,
            vec![
                [1.0, 0.0, 0.0, 1.0],
                [0.0, 1.0, 0.0, 1.0],
                [0.0, 0.0, 1.0, 1.0],
                [1.0, 1.0, 1.0, 1.0],
            ],
            "checker",
        )
    }

    #[test]
    fn test_solid_color_texture() {
        let tex = Texture::solid_color(Color::new(1.0, 0.5, 0.0));
        let sample = tex.sample(0.5, 0.5);
        assert!((sample - Color::new(1.0, 0.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_sample_is_vertically_flipped() {
        let tex = checker();
        // v = 1 is the top row of the image.
        assert!((tex.sample(0.0, 1.0) - Color::new(1.0, 0.0, 0.0)).length() < 1e-6);
        assert!((tex.sample(0.0, 0.0) - Color::new(0.0, 0.0, 1.0)).length() < 1e-6);
        assert!((tex.sample(1.0, 0.0) - Color::ONE).length() < 1e-6);
    }

    #[test]
    fn test_sample_clamps_outside_range() {
        let tex = checker();
        assert_eq!(tex.sample(-3.0, 7.0), tex.sample(0.0, 1.0));
        assert_eq!(tex.sample(4.0, -1.0), tex.sample(1.0, 0.0));
    }

    #[test]
    fn test_sample_bilinear_center() {
        let tex = checker();
        let center = tex.sample(0.5, 0.5);
        assert!((center - Color::new(0.5, 0.5, 0.5)).length() < 1e-6);
    }

    #[test]
    fn test_store_missing_texture_is_magenta() {
        let mut store = TextureStore::new();
        store.insert("checker", checker());

        assert!(store.has("checker"));
        assert!(!store.has("nope.png"));
        assert_eq!(store.sample("nope.png", 0.5, 0.5), MISSING_TEXTURE_COLOR);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_preload_skips_missing_files() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut store = TextureStore::with_base_dir("/definitely/not/here");
        let loaded =
            store.preload([("wood.png", ColorSpace::Srgb), ("bump.png", ColorSpace::Linear)]);

        assert_eq!(loaded, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_srgb_to_linear() {
        assert!((srgb_to_linear(0) - 0.0).abs() < 0.001);
        assert!((srgb_to_linear(255) - 1.0).abs() < 0.001);

        // Mid-gray is darker in linear
        let mid = srgb_to_linear(128);
        assert!(mid < 0.5);
        assert!(mid > 0.1);
    }
}
