//! Screen-space text renderer
//!
//! Lays out strings of ASCII text along a horizontal pen line and draws one
//! textured quad per glyph. All glyphs share a single dynamic vertex buffer
//! sized for exactly one quad, so a string of N characters costs N draw
//! calls. This keeps the renderer simple at the price of scalability; batching
//! would change the call count but not the pixels produced.
//!
//! # Coordinate System
//!
//! - Origin (0, 0) is the bottom-left corner of the viewport
//! - +X points right, +Y points up
//! - Units are pixels; the projection is recomputed on every resize
//!
//! # Threading
//!
//! The renderer is not `Send` and must stay on the thread that owns the GL
//! context. Draw calls mutate the shared vertex buffer, so they must not be
//! interleaved.

use std::rc::Rc;

use super::projection::viewport_projection;
use super::{FontAtlas, FontError, Glyph};
use crate::foundation::math::{Mat4, Rgb, Vec2};
use crate::render::api::{BackendError, BackendResult, GraphicsDevice, VertexLayout};
use crate::render::resources::{
    ShaderError, ShaderProgram, ShaderSources, VertexArray, VertexBuffer,
};

/// Name of the projection matrix uniform
pub const PROJECTION_UNIFORM: &str = "projection";
/// Name of the glyph sampler uniform
pub const TEXTURE_UNIFORM: &str = "text";
/// Name of the text color uniform
pub const COLOR_UNIFORM: &str = "textColour";

/// Texture unit glyphs are sampled from
pub const GLYPH_TEXTURE_UNIT: u32 = 0;

/// Vertices per glyph quad (two triangles)
pub const QUAD_VERTICES: u32 = 6;

/// Interleaved vertex layout: 2 position + 2 texture coordinate floats
pub const GLYPH_VERTEX_LAYOUT: VertexLayout = VertexLayout {
    location: 0,
    components: 4,
};

/// Vertex data for one glyph: six `[x, y, u, v]` vertices
pub type GlyphQuad = [[f32; 4]; QUAD_VERTICES as usize];

const QUAD_BYTES: usize = std::mem::size_of::<GlyphQuad>();

/// Glyph shader sources compiled into the crate
pub fn default_shaders() -> ShaderSources {
    ShaderSources::new(
        include_str!("../../../../../../resources/shaders/text.vert"),
        include_str!("../../../../../../resources/shaders/text.frag"),
    )
}

/// Result type for renderer initialisation
pub type TextResult<T> = Result<T, TextError>;

/// Errors that abort text renderer initialisation
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The glyph shader failed to compile or link
    #[error(transparent)]
    Shader(#[from] ShaderError),

    /// A GPU object could not be created
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The font atlas could not be built
    #[error(transparent)]
    Font(#[from] FontError),

    /// The initial viewport has no area
    #[error("Viewport must be non-empty, got {width}x{height}")]
    InvalidViewport {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}

/// A single request to draw a string
#[derive(Debug, Clone, Copy)]
pub struct DrawRequest<'a> {
    /// Characters to draw, left to right
    pub text: &'a str,
    /// Pen start position (baseline-left) in pixels
    pub origin: Vec2,
    /// Uniform scale applied to glyph metrics
    pub scale: f32,
    /// Text color
    pub color: Rgb,
}

/// Outcome of drawing one string
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRun {
    /// Number of draw calls submitted
    pub draw_calls: usize,
    /// Pen position after the last glyph
    pub pen: Vec2,
}

/// Text renderer owning the font atlas and every GPU object used for text
pub struct TextRenderer {
    atlas: FontAtlas,
    program: ShaderProgram,
    vertex_array: VertexArray,
    vertex_buffer: VertexBuffer,
    viewport: (u32, u32),
    projection: Mat4,
}

impl TextRenderer {
    /// Set up blending, the glyph shader and the shared quad buffer.
    ///
    /// On failure every object created so far, including the atlas
    /// textures, is released before the error is returned.
    pub fn initialise(
        device: &Rc<dyn GraphicsDevice>,
        atlas: FontAtlas,
        width: u32,
        height: u32,
        shaders: &ShaderSources,
    ) -> TextResult<Self> {
        if width == 0 || height == 0 {
            return Err(TextError::InvalidViewport { width, height });
        }

        device.enable_alpha_blending();

        let program = ShaderProgram::link(device, shaders)?;

        let projection = viewport_projection(width, height);
        program.set_mat4(PROJECTION_UNIFORM, &projection);
        program.set_i32(TEXTURE_UNIFORM, GLYPH_TEXTURE_UNIT as i32);

        let vertex_buffer = VertexBuffer::dynamic(device, QUAD_BYTES)?;
        let vertex_array = VertexArray::new(device, &vertex_buffer, GLYPH_VERTEX_LAYOUT)?;

        log::info!(
            "Text renderer initialised: {}x{} viewport, {} glyphs",
            width,
            height,
            atlas.len()
        );

        Ok(Self {
            atlas,
            program,
            vertex_array,
            vertex_buffer,
            viewport: (width, height),
            projection,
        })
    }

    /// Recompute the projection for a new viewport size.
    ///
    /// Must run before the next draw. A zero-sized viewport (a minimized
    /// window) keeps the previous projection.
    pub fn on_viewport_resized(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("Ignoring resize to empty viewport {}x{}", width, height);
            return;
        }

        self.viewport = (width, height);
        self.projection = viewport_projection(width, height);
        self.program.set_mat4(PROJECTION_UNIFORM, &self.projection);

        log::debug!("Text projection updated for {}x{}", width, height);
    }

    /// Draw `text` with its baseline starting at `origin`.
    ///
    /// Characters outside the ASCII domain or missing from the atlas are
    /// replaced by the atlas fallback glyph, or skipped when there is none.
    /// No kerning is applied and newlines are not special: they are looked
    /// up like any other code.
    pub fn draw_text(&self, text: &str, origin: Vec2, scale: f32, color: Rgb) -> BackendResult<TextRun> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(BackendError::InvalidArgument(format!(
                "text scale must be positive and finite, got {}",
                scale
            )));
        }

        self.program.bind();
        self.program.set_vec3(COLOR_UNIFORM, &color);

        let mut pen = origin;
        let mut draw_calls = 0;

        for ch in text.chars() {
            let Some(glyph) = self.atlas.resolve(ch) else {
                log::trace!("No glyph for {:?}, skipping", ch);
                continue;
            };

            let quad = quad_vertices(glyph, pen, scale);

            glyph.texture().bind(GLYPH_TEXTURE_UNIT);
            self.vertex_buffer.write(bytemuck::cast_slice::<[f32; 4], f32>(&quad[..]));
            self.vertex_array.draw_triangles(QUAD_VERTICES);
            draw_calls += 1;

            pen.x += glyph.advance() as f32 * scale;
        }

        Ok(TextRun { draw_calls, pen })
    }

    /// Draw a [`DrawRequest`]
    pub fn draw(&self, request: &DrawRequest<'_>) -> BackendResult<TextRun> {
        self.draw_text(request.text, request.origin, request.scale, request.color)
    }

    /// Font atlas used for lookups
    pub fn atlas(&self) -> &FontAtlas {
        &self.atlas
    }

    /// Current projection matrix
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Current viewport size in pixels
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Handle of the glyph shader program
    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }
}

/// Build the quad covering `glyph` with the pen at `pen`.
///
/// The bitmap's top row maps to `v = 0` and its bottom row to `v = 1`,
/// flipping the rasterizer's top-to-bottom rows into GL's bottom-up
/// texture space.
pub fn quad_vertices(glyph: &Glyph, pen: Vec2, scale: f32) -> GlyphQuad {
    let size = glyph.size();
    let bearing = glyph.bearing();

    let x = pen.x + bearing.x as f32 * scale;
    let y = pen.y - (size.y as f32 - bearing.y as f32) * scale;
    let w = size.x as f32 * scale;
    let h = size.y as f32 * scale;

    [
        [x, y + h, 0.0, 0.0],
        [x, y, 0.0, 1.0],
        [x + w, y, 1.0, 1.0],
        [x, y + h, 0.0, 0.0],
        [x + w, y, 1.0, 1.0],
        [x + w, y + h, 1.0, 0.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::colors;
    use crate::render::api::{RecordingDevice, ShaderStage, UniformValue};
    use crate::render::systems::text::font_atlas::tests::{code, recording, ScriptedRasterizer};
    use crate::render::systems::text::{GlyphCode, DEFAULT_DPI};
    use approx::assert_relative_eq;

    fn atlas(device: &Rc<dyn GraphicsDevice>, failing: &[u8]) -> FontAtlas {
        FontAtlas::build(ScriptedRasterizer::failing(failing), 20.0, DEFAULT_DPI, device).unwrap()
    }

    fn renderer(failing: &[u8]) -> (Rc<RecordingDevice>, TextRenderer) {
        let (recorder, device) = recording();
        let atlas = atlas(&device, failing);
        let renderer = TextRenderer::initialise(&device, atlas, 600, 400, &default_shaders()).unwrap();
        (recorder, renderer)
    }

    fn advance(ch: u8) -> f32 {
        ScriptedRasterizer::metrics(ch).4 as f32
    }

    #[test]
    fn test_initialise_sets_up_pipeline() {
        let (recorder, renderer) = renderer(&[]);
        let program = renderer.program().handle();

        assert!(recorder.blending_enabled());
        assert_eq!(recorder.live_programs(), 1);
        assert_eq!(recorder.live_shaders(), 0);
        assert_eq!(recorder.live_buffers(), 1);
        assert_eq!(recorder.live_vertex_arrays(), 1);
        assert_eq!(
            recorder.uniform(program, PROJECTION_UNIFORM),
            Some(UniformValue::Mat4(viewport_projection(600, 400)))
        );
        assert_eq!(recorder.uniform(program, TEXTURE_UNIFORM), Some(UniformValue::Int(0)));
        assert_eq!(renderer.viewport(), (600, 400));
    }

    #[test]
    fn test_shared_buffer_holds_one_quad() {
        let (recorder, renderer) = renderer(&[]);
        assert_eq!(recorder.buffer_len(renderer.vertex_buffer.handle()), Some(24));
        assert_eq!(renderer.vertex_array.layout(), GLYPH_VERTEX_LAYOUT);
    }

    #[test]
    fn test_compile_failure_releases_everything() {
        let (recorder, device) = recording();
        let atlas = atlas(&device, &[]);
        recorder.fail_compile(ShaderStage::Vertex, "0:2: 'vertex' : syntax error");

        let err = TextRenderer::initialise(&device, atlas, 600, 400, &default_shaders())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            TextError::Shader(ShaderError::CompileError { stage: ShaderStage::Vertex, .. })
        ));
        assert_eq!(recorder.live_objects(), 0);
    }

    #[test]
    fn test_link_failure_leaves_no_program_bound() {
        let (recorder, device) = recording();
        let atlas = atlas(&device, &[]);
        recorder.fail_link("link error");

        let err = TextRenderer::initialise(&device, atlas, 600, 400, &default_shaders())
            .err()
            .unwrap();
        assert!(matches!(err, TextError::Shader(ShaderError::LinkError { .. })));
        assert_eq!(recorder.current_program(), None);
        assert_eq!(recorder.live_objects(), 0);
    }

    #[test]
    fn test_empty_viewport_rejected() {
        let (recorder, device) = recording();
        let atlas = atlas(&device, &[]);
        let err = TextRenderer::initialise(&device, atlas, 0, 400, &default_shaders())
            .err()
            .unwrap();
        assert!(matches!(err, TextError::InvalidViewport { width: 0, height: 400 }));
        assert_eq!(recorder.live_objects(), 0);
    }

    #[test]
    fn test_empty_text_issues_no_draws() {
        let (recorder, renderer) = renderer(&[]);
        let origin = Vec2::new(25.0, 40.0);

        let run = renderer.draw_text("", origin, 1.0, colors::white()).unwrap();

        assert_eq!(run.draw_calls, 0);
        assert_eq!(run.pen, origin);
        assert!(recorder.draws().is_empty());
    }

    #[test]
    fn test_one_draw_per_character_and_pen_advance() {
        let (recorder, renderer) = renderer(&[]);
        let text = "Hello, world";
        let origin = Vec2::new(5.0, 300.0);
        let scale = 1.5;

        let run = renderer.draw_text(text, origin, scale, colors::white()).unwrap();

        let total: f32 = text.bytes().map(advance).sum();
        assert_eq!(run.draw_calls, text.len());
        assert_eq!(recorder.draws().len(), text.len());
        assert_relative_eq!(run.pen.x, origin.x + scale * total);
        assert_eq!(run.pen.y, origin.y);
        assert_relative_eq!(run.pen.x - origin.x, renderer.atlas().measure(text, scale));
    }

    #[test]
    fn test_single_glyph_scenario() {
        let (recorder, renderer) = renderer(&[]);
        let glyph_a = renderer.atlas().glyph(code('A')).unwrap();

        let run = renderer
            .draw_text("A", Vec2::new(10.0, 10.0), 1.0, colors::white())
            .unwrap();

        let draws = recorder.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].vertex_count, QUAD_VERTICES);
        assert_eq!(draws[0].texture, Some(glyph_a.texture().handle()));
        assert_eq!(draws[0].program, Some(renderer.program().handle()));

        // First vertex is the quad's top-left corner
        let left_edge = draws[0].vertices[0];
        assert_relative_eq!(left_edge, 10.0 + glyph_a.bearing().x as f32);
        assert_relative_eq!(run.pen.x, 10.0 + glyph_a.advance() as f32);
    }

    #[test]
    fn test_quad_geometry_and_texture_flip() {
        let (_recorder, renderer) = renderer(&[]);
        let glyph = renderer.atlas().glyph(code('g')).unwrap();
        let (width, height) = (glyph.size().x as f32, glyph.size().y as f32);
        let (left, top) = (glyph.bearing().x as f32, glyph.bearing().y as f32);
        let scale = 2.0;

        let quad = quad_vertices(glyph, Vec2::new(100.0, 50.0), scale);

        let x = 100.0 + left * scale;
        let bottom = 50.0 - (height - top) * scale;
        let upper = bottom + height * scale;
        for [vx, vy, u, v] in quad {
            assert!(vx == x || vx == x + width * scale);
            assert!(vy == bottom || vy == upper);
            // Left edge samples u = 0, top row samples v = 0
            assert_eq!(u, if vx == x { 0.0 } else { 1.0 });
            assert_eq!(v, if vy == upper { 0.0 } else { 1.0 });
        }
    }

    #[test]
    fn test_color_uniform_set_per_draw() {
        let (recorder, renderer) = renderer(&[]);
        let color = Rgb::new(0.2, 0.4, 0.8);
        renderer.draw_text("x", Vec2::new(0.0, 0.0), 1.0, color).unwrap();
        assert_eq!(
            recorder.uniform(renderer.program().handle(), COLOR_UNIFORM),
            Some(UniformValue::Vec3(color))
        );
    }

    #[test]
    fn test_all_draws_share_one_vertex_array() {
        let (recorder, renderer) = renderer(&[]);
        renderer.draw_text("abc", Vec2::new(0.0, 0.0), 1.0, colors::white()).unwrap();

        let draws = recorder.draws();
        assert!(draws.iter().all(|draw| draw.vertex_array == renderer.vertex_array.handle()));
        // Each draw saw its own glyph's quad
        assert_ne!(draws[0].vertices, draws[1].vertices);
    }

    #[test]
    fn test_newline_is_an_ordinary_code() {
        let (recorder, renderer) = renderer(&[]);
        let origin = Vec2::new(7.0, 90.0);
        let newline = renderer.atlas().glyph(code('\n')).unwrap().texture().handle();

        let run = renderer.draw_text("a\nb", origin, 1.0, colors::white()).unwrap();

        let draws = recorder.draws();
        assert_eq!(run.draw_calls, 3);
        assert_eq!(draws.len(), 3);
        assert_eq!(draws[1].texture, Some(newline));
        assert_eq!(run.pen.y, origin.y);
        assert_relative_eq!(run.pen.x, origin.x + advance(b'a') + advance(b'\n') + advance(b'b'));
    }

    #[test]
    fn test_each_frame_redraws_from_origin() {
        let (recorder, renderer) = renderer(&[]);
        let origin = Vec2::new(12.0, 30.0);

        let first = renderer.draw_text("hi", origin, 1.0, colors::white()).unwrap();
        let first_frame = recorder.draws();
        recorder.clear_draws();
        assert!(recorder.draws().is_empty());

        let second = renderer.draw_text("hi", origin, 1.0, colors::white()).unwrap();

        assert_eq!(first, second);
        assert_eq!(recorder.draws(), first_frame);
    }

    #[test]
    fn test_resize_updates_projection() {
        let (recorder, mut renderer) = renderer(&[]);
        let program = renderer.program().handle();

        renderer.on_viewport_resized(800, 600);

        assert_eq!(renderer.viewport(), (800, 600));
        assert_eq!(*renderer.projection(), viewport_projection(800, 600));
        assert_eq!(
            recorder.uniform(program, PROJECTION_UNIFORM),
            Some(UniformValue::Mat4(viewport_projection(800, 600)))
        );
    }

    #[test]
    fn test_zero_resize_keeps_projection() {
        let (_recorder, mut renderer) = renderer(&[]);
        renderer.on_viewport_resized(0, 0);
        assert_eq!(renderer.viewport(), (600, 400));
        assert_eq!(*renderer.projection(), viewport_projection(600, 400));
    }

    #[test]
    fn test_missing_glyph_without_fallback_is_skipped() {
        let (recorder, renderer) = renderer(&[b'B']);
        let origin = Vec2::new(0.0, 0.0);

        let run = renderer.draw_text("ABé", origin, 1.0, colors::white()).unwrap();

        assert_eq!(run.draw_calls, 1);
        assert_eq!(recorder.draws().len(), 1);
        assert_relative_eq!(run.pen.x, advance(b'A'));
    }

    #[test]
    fn test_missing_glyph_uses_fallback() {
        let (recorder, device) = recording();
        let atlas = atlas(&device, &[b'B']).with_fallback(GlyphCode::new(b'?'));
        let renderer = TextRenderer::initialise(&device, atlas, 600, 400, &default_shaders()).unwrap();
        let question = renderer.atlas().glyph(code('?')).unwrap().texture().handle();

        let run = renderer.draw_text("Bé", Vec2::new(0.0, 0.0), 1.0, colors::white()).unwrap();

        assert_eq!(run.draw_calls, 2);
        assert!(recorder.draws().iter().all(|draw| draw.texture == Some(question)));
        assert_relative_eq!(run.pen.x, 2.0 * advance(b'?'));
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let (recorder, renderer) = renderer(&[]);
        for scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let result = renderer.draw_text("abc", Vec2::new(0.0, 0.0), scale, colors::white());
            assert!(matches!(result, Err(BackendError::InvalidArgument(_))));
        }
        assert!(recorder.draws().is_empty());
    }

    #[test]
    fn test_draw_does_not_mutate_atlas() {
        let (_recorder, renderer) = renderer(&[]);
        let before: Vec<_> = GlyphCode::all()
            .filter_map(|c| renderer.atlas().glyph(c))
            .map(|g| (g.size(), g.bearing(), g.advance(), g.texture().handle()))
            .collect();

        renderer.draw_text("The quick brown fox", Vec2::new(1.0, 2.0), 1.0, colors::black()).unwrap();

        let after: Vec<_> = GlyphCode::all()
            .filter_map(|c| renderer.atlas().glyph(c))
            .map(|g| (g.size(), g.bearing(), g.advance(), g.texture().handle()))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_draw_request() {
        let (recorder, renderer) = renderer(&[]);
        let request = DrawRequest {
            text: "ok",
            origin: Vec2::new(3.0, 4.0),
            scale: 1.0,
            color: colors::white(),
        };
        let run = renderer.draw(&request).unwrap();
        assert_eq!(run.draw_calls, 2);
        assert_eq!(recorder.draws().len(), 2);
    }

    #[test]
    fn test_drop_releases_all_gpu_objects() {
        let (recorder, renderer) = renderer(&[]);
        assert!(recorder.live_objects() > 0);
        drop(renderer);
        assert_eq!(recorder.live_objects(), 0);
    }
}
