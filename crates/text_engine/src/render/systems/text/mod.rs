//! ASCII text rendering
//!
//! - [`font_atlas`]: rasterizes the 128 ASCII codes into per-glyph textures
//! - [`projection`]: pixel-space orthographic projection
//! - [`text_renderer`]: lays out strings and issues one draw per glyph

pub mod font_atlas;
pub mod glyph;
pub mod projection;
pub mod rasterizer;
pub mod text_renderer;

pub use font_atlas::{FontAtlas, FontError, FontResult, DEFAULT_DPI};
pub use glyph::{Glyph, GlyphCode, OutOfDomain};
pub use projection::{orthographic, viewport_projection};
pub use rasterizer::{glyph_from_metrics, FontdueRasterizer, GlyphRasterizer, RasterizedGlyph, POINTS_PER_INCH};
pub use text_renderer::{
    default_shaders, quad_vertices, DrawRequest, GlyphQuad, TextError, TextRenderer, TextResult, TextRun,
};
