//! GLFW window with an OpenGL 3.3 core context

use glfw::Context;
use thiserror::Error;

use crate::render::api::GraphicsDevice;
use crate::render::opengl::GlowDevice;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialised
    #[error("GLFW initialization failed")]
    InitializationFailed,

    /// The window or its GL context could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// Any other GLFW failure
    #[error("GLFW error: {0}")]
    GlfwError(String),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Application window and its current GL context
pub struct WindowHandle {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl WindowHandle {
    /// Create a resizable window and make its context current
    pub fn new(width: u32, height: u32, title: &str) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors).map_err(|_| WindowError::InitializationFailed)?;

        glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        #[cfg(target_os = "macos")]
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.make_current();
        window.set_framebuffer_size_polling(true);
        window.set_close_polling(true);

        log::info!("Initialised window \"{}\" ({}x{})", title, width, height);

        Ok(Self { glfw, window, events })
    }

    /// Load GL function pointers for the current context.
    ///
    /// The returned device sets the viewport to the current framebuffer size.
    #[allow(unsafe_code)]
    pub fn load_gl(&mut self) -> GlowDevice {
        let window = &mut self.window;
        // SAFETY: the context was made current in `new` and outlives the
        // loader calls made here.
        let device = unsafe { GlowDevice::from_loader(|symbol| window.get_proc_address(symbol) as *const _) };

        let (width, height) = self.framebuffer_size();
        device.set_viewport(width, height);

        log::info!("Initialised OpenGL: {}", device.version_string());
        device
    }

    /// Whether the user asked to close the window
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Process pending window events
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    /// Present the back buffer
    pub fn swap_buffers(&mut self) {
        self.window.swap_buffers();
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (u32::try_from(width).unwrap_or(0), u32::try_from(height).unwrap_or(0))
    }

    /// Most recent framebuffer resize since the last call, if any
    pub fn drain_resizes(&mut self) -> Option<(u32, u32)> {
        let mut latest = None;
        for (_, event) in glfw::flush_messages(&self.events) {
            if let glfw::WindowEvent::FramebufferSize(width, height) = event {
                latest = Some((u32::try_from(width).unwrap_or(0), u32::try_from(height).unwrap_or(0)));
            }
        }
        latest
    }
}
