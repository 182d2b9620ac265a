//! Window management
//!
//! A GLFW window owning the OpenGL context the text renderer draws into.
//! Everything GL-related must run on the thread that created the window.

pub mod handle;

pub use handle::{WindowError, WindowHandle, WindowResult};
