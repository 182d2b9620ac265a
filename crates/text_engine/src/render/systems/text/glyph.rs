//! Glyph codes and rasterized glyph data

use std::fmt;

use nalgebra::Vector2;

use crate::render::resources::Texture;

/// Character code in the 7-bit ASCII domain (0..=127)
///
/// Constructing one validates the range, so atlas lookups by `GlyphCode`
/// can never index past the glyph table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlyphCode(u8);

/// Error returned when a value falls outside the ASCII domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Code point U+{0:04X} is outside the ASCII glyph domain")]
pub struct OutOfDomain(pub u32);

impl GlyphCode {
    /// Number of codes in the domain
    pub const COUNT: usize = 128;

    /// Largest valid code
    pub const MAX: u8 = 127;

    /// Create a code, returning `None` outside 0..=127
    pub const fn new(code: u8) -> Option<Self> {
        if code <= Self::MAX {
            Some(Self(code))
        } else {
            None
        }
    }

    /// Every code in ascending order
    pub fn all() -> impl Iterator<Item = Self> {
        (0..=Self::MAX).map(Self)
    }

    /// Raw code value
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Position in a table of [`Self::COUNT`] entries
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The code as a `char`
    pub const fn as_char(self) -> char {
        self.0 as char
    }
}

impl TryFrom<u8> for GlyphCode {
    type Error = OutOfDomain;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(OutOfDomain(u32::from(value)))
    }
}

impl TryFrom<u32> for GlyphCode {
    type Error = OutOfDomain;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(OutOfDomain(value))
    }
}

impl TryFrom<char> for GlyphCode {
    type Error = OutOfDomain;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        Self::try_from(u32::from(value))
    }
}

impl fmt::Display for GlyphCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.as_char().is_ascii_graphic() {
            write!(f, "'{}'", self.as_char())
        } else {
            write!(f, "0x{:02X}", self.0)
        }
    }
}

/// One rasterized character: its texture and layout metrics
///
/// Owns its texture exclusively; the texture is released when the glyph is
/// dropped. Immutable once created.
#[derive(Debug)]
pub struct Glyph {
    texture: Texture,
    size: Vector2<u32>,
    bearing: Vector2<i32>,
    advance: u32,
}

impl Glyph {
    /// Assemble a glyph from an uploaded texture and its metrics
    pub fn new(texture: Texture, size: Vector2<u32>, bearing: Vector2<i32>, advance: u32) -> Self {
        Self {
            texture,
            size,
            bearing,
            advance,
        }
    }

    /// Texture holding the glyph's coverage bitmap
    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    /// Bitmap size in pixels (width, height)
    pub fn size(&self) -> Vector2<u32> {
        self.size
    }

    /// Offset from the pen origin to the bitmap's top-left corner (left, top)
    pub fn bearing(&self) -> Vector2<i32> {
        self.bearing
    }

    /// Horizontal pixels to move the pen after drawing
    pub fn advance(&self) -> u32 {
        self.advance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_bounds() {
        assert_eq!(GlyphCode::new(0).map(GlyphCode::value), Some(0));
        assert_eq!(GlyphCode::new(127).map(GlyphCode::value), Some(127));
        assert_eq!(GlyphCode::new(128), None);
        assert_eq!(GlyphCode::new(255), None);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(GlyphCode::try_from('A').unwrap().value(), 65);
        assert_eq!(GlyphCode::try_from('é'), Err(OutOfDomain(0xE9)));
        assert_eq!(GlyphCode::try_from(0x1F600_u32), Err(OutOfDomain(0x1F600)));
        assert_eq!(GlyphCode::try_from(200_u8), Err(OutOfDomain(200)));
    }

    #[test]
    fn test_all_is_ascending_and_complete() {
        let codes: Vec<u8> = GlyphCode::all().map(GlyphCode::value).collect();
        assert_eq!(codes.len(), GlyphCode::COUNT);
        assert!(codes.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_display() {
        assert_eq!(GlyphCode::try_from('x').unwrap().to_string(), "'x'");
        assert_eq!(GlyphCode::try_from('\n').unwrap().to_string(), "0x0A");
    }
}
