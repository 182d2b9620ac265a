//! OpenGL backend
//!
//! Production [`GraphicsDevice`](crate::render::api::GraphicsDevice) built on `glow`.

pub mod device;

pub use device::GlowDevice;
