//! Font rasterization service
//!
//! Turns a character code into an 8-bit coverage bitmap plus the metrics the
//! atlas needs. [`FontdueRasterizer`] is the production implementation; the
//! trait exists so atlas construction can be driven by other sources.

use std::path::Path;

use fontdue::{Font, FontSettings, Metrics, OutlineBounds};

use super::{FontError, FontResult, GlyphCode};

/// Points per inch; character sizes are given in points at a fixed DPI
pub const POINTS_PER_INCH: f32 = 72.0;

/// A single rasterized glyph as produced by the font service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterizedGlyph {
    /// Bitmap width in pixels
    pub width: u32,
    /// Bitmap height in pixels
    pub height: u32,
    /// Offset from the pen to the bitmap's left edge
    pub bearing_left: i32,
    /// Offset from the baseline up to the bitmap's top row
    pub bearing_top: i32,
    /// Horizontal advance in 26.6 fixed point (1/64 pixel)
    pub advance_26_6: i64,
    /// Row-major coverage, top row first, no row padding
    pub bitmap: Vec<u8>,
}

impl RasterizedGlyph {
    /// Advance in whole pixels (26.6 fixed point shifted right by 6)
    pub fn advance_pixels(&self) -> u32 {
        u32::try_from(self.advance_26_6 >> 6).unwrap_or(0)
    }
}

/// Font rasterization service
pub trait GlyphRasterizer {
    /// Set the character size in points at the given resolution
    fn set_char_size(&mut self, points: f32, dpi: u32);

    /// Rasterize one character code
    fn rasterize(&mut self, code: GlyphCode) -> FontResult<RasterizedGlyph>;
}

/// Rasterizer backed by a TrueType/OpenType font parsed with `fontdue`
pub struct FontdueRasterizer {
    font: Font,
    pixel_size: f32,
}

impl FontdueRasterizer {
    /// Open and parse a font file
    pub fn open(path: impl AsRef<Path>) -> FontResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| FontError::LoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_bytes(&data).map_err(|e| match e {
            FontError::LoadError { reason, .. } => FontError::LoadError {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parse a font from raw file bytes (TTF or OTF)
    pub fn from_bytes(data: &[u8]) -> FontResult<Self> {
        let font = Font::from_bytes(data, FontSettings::default()).map_err(|e| FontError::LoadError {
            path: "<memory>".to_string(),
            reason: format!("fontdue error: {}", e),
        })?;

        Ok(Self {
            font,
            pixel_size: 0.0,
        })
    }

    /// Current rasterization size in pixels
    pub fn pixel_size(&self) -> f32 {
        self.pixel_size
    }
}

impl GlyphRasterizer for FontdueRasterizer {
    fn set_char_size(&mut self, points: f32, dpi: u32) {
        self.pixel_size = points * dpi as f32 / POINTS_PER_INCH;
        log::debug!("Rasterizing at {}pt / {} DPI = {:.1}px", points, dpi, self.pixel_size);
    }

    fn rasterize(&mut self, code: GlyphCode) -> FontResult<RasterizedGlyph> {
        if self.pixel_size <= 0.0 {
            return Err(FontError::RasterizeError(
                code,
                "character size has not been set".to_string(),
            ));
        }

        let (metrics, bitmap) = self.font.rasterize(code.as_char(), self.pixel_size);
        glyph_from_metrics(code, &metrics, bitmap)
    }
}

/// Convert fontdue's metrics into the atlas' conventions.
///
/// fontdue reports the bitmap's bottom edge (`ymin`) and a fractional
/// advance; the atlas wants the distance from the baseline up to the top row
/// and an advance in 26.6 fixed point.
pub fn glyph_from_metrics(code: GlyphCode, metrics: &Metrics, bitmap: Vec<u8>) -> FontResult<RasterizedGlyph> {
    if bitmap.len() != metrics.width * metrics.height {
        return Err(FontError::RasterizeError(
            code,
            format!(
                "bitmap holds {} bytes, expected {}x{}",
                bitmap.len(),
                metrics.width,
                metrics.height
            ),
        ));
    }

    let width = u32::try_from(metrics.width)
        .map_err(|_| FontError::RasterizeError(code, "bitmap too wide".to_string()))?;
    let height = u32::try_from(metrics.height)
        .map_err(|_| FontError::RasterizeError(code, "bitmap too tall".to_string()))?;
    let top_offset =
        i32::try_from(height).map_err(|_| FontError::RasterizeError(code, "bitmap too tall".to_string()))?;

    Ok(RasterizedGlyph {
        width,
        height,
        bearing_left: metrics.xmin,
        bearing_top: metrics.ymin + top_offset,
        advance_26_6: (metrics.advance_width * 64.0).round() as i64,
        bitmap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_conversion_truncates() {
        let glyph = RasterizedGlyph {
            width: 0,
            height: 0,
            bearing_left: 0,
            bearing_top: 0,
            advance_26_6: 13 * 64 + 63,
            bitmap: Vec::new(),
        };
        assert_eq!(glyph.advance_pixels(), 13);
    }

    #[test]
    fn test_negative_advance_clamps_to_zero() {
        let glyph = RasterizedGlyph {
            width: 0,
            height: 0,
            bearing_left: 0,
            bearing_top: 0,
            advance_26_6: -64,
            bitmap: Vec::new(),
        };
        assert_eq!(glyph.advance_pixels(), 0);
    }

    fn metrics(xmin: i32, ymin: i32, width: usize, height: usize, advance_width: f32) -> Metrics {
        Metrics {
            xmin,
            ymin,
            width,
            height,
            advance_width,
            advance_height: 0.0,
            bounds: OutlineBounds {
                xmin: xmin as f32,
                ymin: ymin as f32,
                width: width as f32,
                height: height as f32,
            },
        }
    }

    fn code(ch: char) -> GlyphCode {
        GlyphCode::try_from(ch).unwrap()
    }

    #[test]
    fn test_bearing_top_measured_from_baseline() {
        // 'g' style glyph: 4 rows below the baseline, 11 above
        let glyph = glyph_from_metrics(code('g'), &metrics(1, -4, 8, 15, 9.0), vec![0; 120]).unwrap();
        assert_eq!(glyph.bearing_left, 1);
        assert_eq!(glyph.bearing_top, 11);
        assert_eq!((glyph.width, glyph.height), (8, 15));

        // Bitmap sitting above the baseline
        let glyph = glyph_from_metrics(code('^'), &metrics(0, 7, 5, 3, 6.0), vec![0; 15]).unwrap();
        assert_eq!(glyph.bearing_top, 10);
    }

    #[test]
    fn test_advance_rounded_to_26_6() {
        let glyph = glyph_from_metrics(code('A'), &metrics(0, 0, 2, 2, 12.3), vec![0; 4]).unwrap();
        assert_eq!(glyph.advance_26_6, 787);
        assert_eq!(glyph.advance_pixels(), 12);

        let glyph = glyph_from_metrics(code('A'), &metrics(0, 0, 2, 2, 12.999), vec![0; 4]).unwrap();
        assert_eq!(glyph.advance_26_6, 832);
        assert_eq!(glyph.advance_pixels(), 13);
    }

    #[test]
    fn test_empty_glyph_keeps_advance() {
        let glyph = glyph_from_metrics(code(' '), &metrics(0, 0, 0, 0, 5.5), Vec::new()).unwrap();
        assert_eq!((glyph.width, glyph.height), (0, 0));
        assert_eq!(glyph.bearing_top, 0);
        assert_eq!(glyph.advance_pixels(), 5);
    }

    #[test]
    fn test_bitmap_length_mismatch_rejected() {
        let err = glyph_from_metrics(code('x'), &metrics(0, 0, 3, 3, 4.0), vec![0; 8]).err().unwrap();
        assert!(matches!(err, FontError::RasterizeError(c, _) if c == code('x')));
    }

    #[test]
    fn test_open_missing_file() {
        let err = FontdueRasterizer::open("no/such/font.ttf").err().unwrap();
        assert!(matches!(err, FontError::LoadError { ref path, .. } if path.contains("font.ttf")));
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        let err = FontdueRasterizer::from_bytes(b"definitely not a font").err().unwrap();
        assert!(matches!(err, FontError::LoadError { .. }));
    }
}
