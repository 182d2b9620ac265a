//! # Text Pipeline Configuration
//!
//! Window, font and shader settings for a text-rendering application. Every
//! section has defaults, so a config file only needs the values it changes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::render::resources::{ShaderResult, ShaderSources};
use crate::render::systems::text::{default_shaders, GlyphCode, DEFAULT_DPI};

pub use crate::config::{Config, ConfigError, ConfigResult};

/// Window size, title and clear colour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Initial width in pixels
    pub width: u32,
    /// Initial height in pixels
    pub height: u32,
    /// Window title
    pub title: String,
    /// RGBA colour the framebuffer is cleared to each frame
    pub clear_color: [f32; 4],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
            title: "Text Rendering".to_string(),
            clear_color: [0.5, 0.4, 0.6, 1.0],
        }
    }
}

/// Font file and rasterization size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Path to a TrueType or OpenType font
    pub path: PathBuf,
    /// Character size in points
    pub point_size: f32,
    /// Rasterization resolution
    pub dpi: u32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("resources/fonts/default.ttf"),
            point_size: 20.0,
            dpi: DEFAULT_DPI,
        }
    }
}

/// Optional shader files overriding the embedded sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// Vertex shader path
    pub vertex_path: Option<PathBuf>,
    /// Fragment shader path
    pub fragment_path: Option<PathBuf>,
}

impl ShaderConfig {
    /// Read the configured files, or fall back to the embedded sources
    pub fn sources(&self) -> ShaderResult<ShaderSources> {
        match (&self.vertex_path, &self.fragment_path) {
            (Some(vertex), Some(fragment)) => ShaderSources::from_files(vertex, fragment),
            _ => Ok(default_shaders()),
        }
    }

    /// Paths must be given together or not at all
    pub fn validate(&self) -> ConfigResult<()> {
        if self.vertex_path.is_some() != self.fragment_path.is_some() {
            return Err(ConfigError::Invalid(
                "shader paths must set both vertex_path and fragment_path".to_string(),
            ));
        }
        Ok(())
    }
}

/// # Complete Text Application Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Window settings
    pub window: WindowConfig,
    /// Font settings
    pub font: FontConfig,
    /// Character drawn in place of missing glyphs; `None` skips them.
    /// TOML has no null, so disabling the fallback needs a RON file.
    pub missing_glyph: Option<char>,
    /// Shader overrides
    pub shaders: ShaderConfig,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            font: FontConfig::default(),
            missing_glyph: Some('?'),
            shaders: ShaderConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl TextConfig {
    /// Check every value is usable
    pub fn validate(&self) -> ConfigResult<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if !self.font.point_size.is_finite() || self.font.point_size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "font point size must be positive, got {}",
                self.font.point_size
            )));
        }
        if self.font.dpi == 0 {
            return Err(ConfigError::Invalid("font dpi must be non-zero".to_string()));
        }
        self.fallback_glyph()?;
        self.shaders.validate()
    }

    /// The fallback character as a glyph code
    pub fn fallback_glyph(&self) -> ConfigResult<Option<GlyphCode>> {
        self.missing_glyph
            .map(|ch| {
                GlyphCode::try_from(ch)
                    .map_err(|e| ConfigError::Invalid(format!("missing_glyph: {}", e)))
            })
            .transpose()
    }
}

impl Config for TextConfig {}
