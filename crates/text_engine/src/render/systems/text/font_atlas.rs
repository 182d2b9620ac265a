//! Font atlas system for text rendering
//!
//! This module rasterizes the ASCII range of a font once at startup and uploads
//! each glyph into its own single-channel GPU texture. The resulting
//! [`FontAtlas`] is immutable and is read by the text renderer every frame.

use std::path::Path;
use std::rc::Rc;

use nalgebra::Vector2;

use super::rasterizer::{FontdueRasterizer, GlyphRasterizer, RasterizedGlyph};
use super::{Glyph, GlyphCode};
use crate::render::api::{BackendError, GraphicsDevice, SamplerSettings};
use crate::render::resources::Texture;

/// Resolution used when none is specified
pub const DEFAULT_DPI: u32 = 300;

/// Result type for font operations
pub type FontResult<T> = Result<T, FontError>;

/// Errors that can occur during font operations
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    /// Failed to open or parse the font resource
    #[error("Failed to load font '{path}': {reason}")]
    LoadError {
        /// Font file that failed to load
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Failed to rasterize a specific glyph
    #[error("Failed to rasterize glyph {0}: {1}")]
    RasterizeError(GlyphCode, String),

    /// A glyph texture could not be created
    #[error("Failed to upload glyph texture: {0}")]
    Backend(#[from] BackendError),
}

/// Glyph metrics and textures for one (font, point size) pair
///
/// Indexed by [`GlyphCode`]. Codes whose rasterization failed have no entry.
#[derive(Debug)]
pub struct FontAtlas {
    glyphs: Vec<Option<Glyph>>,
    point_size: f32,
    dpi: u32,
    fallback: Option<GlyphCode>,
}

impl FontAtlas {
    /// Load a font file and build its atlas at the default resolution
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use std::rc::Rc;
    /// # use text_engine::render::api::{GraphicsDevice, RecordingDevice};
    /// # use text_engine::render::systems::text::FontAtlas;
    /// let device: Rc<dyn GraphicsDevice> = Rc::new(RecordingDevice::new());
    /// let atlas = FontAtlas::load("resources/fonts/default.ttf", 20.0, &device)?;
    /// # Ok::<(), text_engine::render::systems::text::FontError>(())
    /// ```
    pub fn load(
        path: impl AsRef<Path>,
        point_size: f32,
        device: &Rc<dyn GraphicsDevice>,
    ) -> FontResult<Self> {
        Self::load_with_dpi(path, point_size, DEFAULT_DPI, device)
    }

    /// Load a font file and build its atlas at a specific resolution
    pub fn load_with_dpi(
        path: impl AsRef<Path>,
        point_size: f32,
        dpi: u32,
        device: &Rc<dyn GraphicsDevice>,
    ) -> FontResult<Self> {
        let path = path.as_ref();
        let rasterizer = FontdueRasterizer::open(path)?;
        log::info!("Loaded font {}", path.display());
        Self::build(rasterizer, point_size, dpi, device)
    }

    /// Rasterize codes 0..=127 in ascending order and upload each glyph.
    ///
    /// A glyph that fails to rasterize is skipped and left without an entry.
    /// A failed texture upload aborts the build and releases every texture
    /// created so far. The rasterizer is consumed and released before this
    /// returns.
    pub fn build<R: GlyphRasterizer>(
        mut rasterizer: R,
        point_size: f32,
        dpi: u32,
        device: &Rc<dyn GraphicsDevice>,
    ) -> FontResult<Self> {
        rasterizer.set_char_size(point_size, dpi);

        let mut glyphs: Vec<Option<Glyph>> = Vec::with_capacity(GlyphCode::COUNT);
        let mut skipped = 0usize;

        for code in GlyphCode::all() {
            let rasterized = match rasterizer.rasterize(code) {
                Ok(rasterized) => rasterized,
                Err(e) => {
                    log::debug!("Skipping glyph {}: {}", code, e);
                    skipped += 1;
                    glyphs.push(None);
                    continue;
                }
            };

            match upload_glyph(device, &rasterized) {
                Ok(glyph) => glyphs.push(Some(glyph)),
                // A bitmap that does not match its own size is a per-glyph fault
                Err(FontError::Backend(BackendError::InvalidArgument(reason))) => {
                    log::warn!("Skipping glyph {}: {}", code, reason);
                    skipped += 1;
                    glyphs.push(None);
                }
                Err(e) => return Err(e),
            }
        }

        drop(rasterizer);

        log::info!(
            "Font atlas built: {} glyphs at {}pt / {} DPI ({} skipped)",
            GlyphCode::COUNT - skipped,
            point_size,
            dpi,
            skipped
        );

        Ok(Self {
            glyphs,
            point_size,
            dpi,
            fallback: None,
        })
    }

    /// Get glyph information for a code
    pub fn glyph(&self, code: GlyphCode) -> Option<&Glyph> {
        self.glyphs.get(code.index()).and_then(Option::as_ref)
    }

    /// Get glyph information for a character, validating the ASCII range
    pub fn glyph_for_char(&self, ch: char) -> Option<&Glyph> {
        GlyphCode::try_from(ch).ok().and_then(|code| self.glyph(code))
    }

    /// Look up a character, substituting the fallback glyph when the
    /// character is outside the domain or has no entry
    pub fn resolve(&self, ch: char) -> Option<&Glyph> {
        self.glyph_for_char(ch)
            .or_else(|| self.fallback.and_then(|code| self.glyph(code)))
    }

    /// Set the glyph drawn in place of missing characters
    pub fn set_fallback(&mut self, fallback: Option<GlyphCode>) {
        if let Some(code) = fallback {
            if self.glyph(code).is_none() {
                log::warn!("Fallback glyph {} is not in the atlas; missing characters will be skipped", code);
            }
        }
        self.fallback = fallback;
    }

    /// Builder-style variant of [`Self::set_fallback`]
    pub fn with_fallback(mut self, fallback: Option<GlyphCode>) -> Self {
        self.set_fallback(fallback);
        self
    }

    /// Code currently used for missing characters
    pub fn fallback(&self) -> Option<GlyphCode> {
        self.fallback
    }

    /// Horizontal pen distance covered by `text` at `scale`.
    ///
    /// Uses the same lookup rules as drawing, so the result equals the pen
    /// movement a draw of the same text would produce.
    pub fn measure(&self, text: &str, scale: f32) -> f32 {
        text.chars()
            .filter_map(|ch| self.resolve(ch))
            .map(|glyph| glyph.advance() as f32 * scale)
            .sum()
    }

    /// Number of codes with a glyph
    pub fn len(&self) -> usize {
        self.glyphs.iter().filter(|glyph| glyph.is_some()).count()
    }

    /// Whether no glyph was rasterized at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size the glyphs were rasterized at, in points
    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    /// Resolution the glyphs were rasterized at
    pub fn dpi(&self) -> u32 {
        self.dpi
    }
}

fn upload_glyph(device: &Rc<dyn GraphicsDevice>, rasterized: &RasterizedGlyph) -> FontResult<Glyph> {
    let texture = Texture::from_r8(
        device,
        rasterized.width,
        rasterized.height,
        &rasterized.bitmap,
        SamplerSettings::CLAMPED_LINEAR,
    )?;

    Ok(Glyph::new(
        texture,
        Vector2::new(rasterized.width, rasterized.height),
        Vector2::new(rasterized.bearing_left, rasterized.bearing_top),
        rasterized.advance_pixels(),
    ))
}
