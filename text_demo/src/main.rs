//! Text rendering demo
//!
//! Opens a window and draws a few strings every frame until it is closed.
//! An optional first argument names a `.toml` or `.ron` config file.

use std::rc::Rc;

use text_engine::core::config::{Config, ConfigError, TextConfig};
use text_engine::foundation::logging;
use text_engine::foundation::math::{colors, Rgb, Vec2};
use text_engine::render::api::{BackendError, GraphicsDevice};
use text_engine::render::resources::ShaderError;
use text_engine::render::systems::text::{DrawRequest, FontAtlas, FontError, TextError, TextRenderer};
use text_engine::render::window::{WindowError, WindowHandle};

/// Anything that stops the demo
#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("window: {0}")]
    Window(#[from] WindowError),

    #[error("font: {0}")]
    Font(#[from] FontError),

    #[error("shader: {0}")]
    Shader(#[from] ShaderError),

    #[error("renderer: {0}")]
    Text(#[from] TextError),

    #[error("draw: {0}")]
    Draw(#[from] BackendError),
}

struct TextDemo {
    // Declared before the window so GL objects go while the context is alive
    renderer: TextRenderer,
    device: Rc<dyn GraphicsDevice>,
    window: WindowHandle,
    clear_color: [f32; 4],
}

impl TextDemo {
    fn new(config: &TextConfig) -> Result<Self, DemoError> {
        let mut window = WindowHandle::new(config.window.width, config.window.height, &config.window.title)?;
        let device: Rc<dyn GraphicsDevice> = Rc::new(window.load_gl());

        let atlas = FontAtlas::load_with_dpi(&config.font.path, config.font.point_size, config.font.dpi, &device)?
            .with_fallback(config.fallback_glyph()?);

        let shaders = config.shaders.sources()?;
        let (width, height) = window.framebuffer_size();
        let renderer = TextRenderer::initialise(&device, atlas, width, height, &shaders)?;

        Ok(Self {
            renderer,
            device,
            window,
            clear_color: config.window.clear_color,
        })
    }

    fn run(&mut self) -> Result<(), DemoError> {
        log::info!("Entering render loop");

        while !self.window.should_close() {
            self.device.clear(self.clear_color);
            self.window.poll_events();

            if let Some((width, height)) = self.window.drain_resizes() {
                self.device.set_viewport(width, height);
                log::info!("Resized OpenGL viewport to {}x{}", width, height);
                self.renderer.on_viewport_resized(width, height);
            }

            self.render_frame()?;
            self.window.swap_buffers();
        }

        log::info!("Window closed");
        Ok(())
    }

    fn render_frame(&self) -> Result<(), DemoError> {
        let (_, height) = self.renderer.viewport();
        let top = height as f32 - 40.0;

        let lines = [
            DrawRequest {
                text: "This is sample text",
                origin: Vec2::new(25.0, 25.0),
                scale: 1.0,
                color: Rgb::new(0.5, 0.8, 0.2),
            },
            DrawRequest {
                text: "(C) LearnOpenGL.com",
                origin: Vec2::new(25.0, top),
                scale: 0.5,
                color: Rgb::new(0.3, 0.7, 0.9),
            },
            DrawRequest {
                text: "Missing glyphs: \u{e9}\u{2603}",
                origin: Vec2::new(25.0, 120.0),
                scale: 0.75,
                color: colors::white(),
            },
        ];

        for line in &lines {
            self.renderer.draw(line)?;
        }
        Ok(())
    }
}

fn load_config() -> Result<TextConfig, ConfigError> {
    let config = match std::env::args().nth(1) {
        Some(path) => TextConfig::load_from_file(&path)?,
        None => TextConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            logging::init();
            log::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    logging::init_with_level(&config.log_level);

    log::info!("Starting text demo");

    let result = TextDemo::new(&config).and_then(|mut demo| demo.run());
    if let Err(e) = &result {
        log::error!("Text demo failed: {}", e);
    }
    result.map_err(Into::into)
}
