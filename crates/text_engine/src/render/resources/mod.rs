//! GPU resource ownership
//!
//! Scoped wrappers around device objects. Every wrapper releases its object
//! on drop, making the owning value the sole authority for its lifetime.

pub mod gpu;
pub mod shader;

pub use gpu::{Texture, VertexArray, VertexBuffer};
pub use shader::{ShaderError, ShaderProgram, ShaderResult, ShaderSources};
