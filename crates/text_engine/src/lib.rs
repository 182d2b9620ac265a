//! # Text Engine
//!
//! ASCII text rendering for OpenGL 3.3 core contexts.
//!
//! ## Features
//!
//! - **Glyph Atlas**: rasterizes the 128 ASCII codes of a TrueType/OpenType font
//!   into one single-channel texture per glyph
//! - **Pixel-Space Projection**: orthographic projection recomputed on resize
//! - **Text Renderer**: one textured quad and one draw call per glyph
//! - **Headless Device**: a recording backend for running the pipeline without a GPU
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use text_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut window = WindowHandle::new(600, 400, "Text")?;
//!     let device: Rc<dyn GraphicsDevice> = Rc::new(window.load_gl());
//!
//!     let atlas = FontAtlas::load("resources/fonts/default.ttf", 20.0, &device)?;
//!     let renderer = TextRenderer::initialise(&device, atlas, 600, 400, &default_shaders())?;
//!
//!     while !window.should_close() {
//!         device.clear([0.5, 0.4, 0.6, 1.0]);
//!         window.poll_events();
//!         renderer.draw_text("Hello", Vec2::new(10.0, 10.0), 1.0, colors::white())?;
//!         window.swap_buffers();
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;

/// Common imports for text engine users
pub mod prelude {
    pub use crate::{
        core::config::{Config, TextConfig},
        foundation::{
            logging,
            math::{colors, Mat4, Rgb, Vec2, Vec3},
        },
        render::{
            api::GraphicsDevice,
            opengl::GlowDevice,
            systems::text::{default_shaders, DrawRequest, FontAtlas, GlyphCode, TextRenderer, TextRun},
            window::WindowHandle,
        },
    };
}
