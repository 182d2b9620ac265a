//! Rendering
//!
//! - [`api`]: the graphics device seam and its headless recorder
//! - [`resources`]: RAII guards for textures, buffers and shader programs
//! - [`opengl`]: the `glow`-backed device
//! - [`window`]: GLFW window and context
//! - [`systems`]: text rendering built on top of the above

pub mod api;
pub mod opengl;
pub mod resources;
pub mod systems;
pub mod window;

pub use api::{BackendError, BackendResult, GraphicsDevice, RecordingDevice};
pub use opengl::GlowDevice;
pub use systems::text::{FontAtlas, TextError, TextRenderer};
pub use window::{WindowError, WindowHandle};
