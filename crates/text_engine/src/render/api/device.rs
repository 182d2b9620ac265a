//! Backend abstraction trait for GPU access
//!
//! This module defines the trait that graphics backends must implement so the
//! text pipeline can create textures, buffers, vertex arrays and shader programs
//! and submit draws without knowing which API sits underneath.
//!
//! # Threading
//! All methods take `&self` and the trait is not `Send`. OpenGL
//! binds one context per thread, and every call must happen on the thread that
//! owns that context.

use std::num::NonZeroU32;

use crate::foundation::math::{Mat4, Vec3};

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors raised by a graphics backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The driver refused to create an object
    #[error("Failed to create {kind}: {reason}")]
    CreationFailed {
        /// Kind of object that could not be created
        kind: &'static str,
        /// Message reported by the driver
        reason: String,
    },

    /// A caller passed a value the backend cannot work with
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub NonZeroU32);

        impl $name {
            /// Raw object name as reported by the backend
            pub fn raw(self) -> u32 {
                self.0.get()
            }
        }
    };
}

gpu_handle!(
    /// Handle to a 2D texture object
    TextureId
);
gpu_handle!(
    /// Handle to a buffer object
    BufferId
);
gpu_handle!(
    /// Handle to a vertex array object
    VertexArrayId
);
gpu_handle!(
    /// Handle to a compiled shader stage
    ShaderId
);
gpu_handle!(
    /// Handle to a linked shader program
    ProgramId
);

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// Texture coordinate wrapping mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    /// Clamp coordinates to the edge texel
    ClampToEdge,
    /// Tile the texture
    Repeat,
}

/// Texture filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Bilinear interpolation
    Linear,
    /// Nearest texel
    Nearest,
}

/// Sampler state applied to a texture object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerSettings {
    /// Wrapping along U
    pub wrap_s: WrapMode,
    /// Wrapping along V
    pub wrap_t: WrapMode,
    /// Minification filter
    pub min_filter: FilterMode,
    /// Magnification filter
    pub mag_filter: FilterMode,
}

impl SamplerSettings {
    /// Clamp on both axes with linear filtering.
    ///
    /// Scaled glyphs stay smooth and never pick up texels from the opposite edge.
    pub const CLAMPED_LINEAR: Self = Self {
        wrap_s: WrapMode::ClampToEdge,
        wrap_t: WrapMode::ClampToEdge,
        min_filter: FilterMode::Linear,
        mag_filter: FilterMode::Linear,
    };
}

/// Layout of the single interleaved float attribute of a vertex array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Attribute location in the vertex shader
    pub location: u32,
    /// Number of `f32` components per vertex
    pub components: u32,
}

impl VertexLayout {
    /// Distance in bytes between consecutive vertices
    pub fn stride_bytes(&self) -> usize {
        self.components as usize * std::mem::size_of::<f32>()
    }
}

/// GPU access used by the text pipeline
///
/// Implemented by [`crate::render::opengl::GlowDevice`] for real rendering and
/// by [`super::recording::RecordingDevice`] for headless use.
pub trait GraphicsDevice {
    /// Create an empty 2D texture object
    fn create_texture(&self) -> BackendResult<TextureId>;

    /// Upload a tightly packed single-channel (red) 8-bit image.
    ///
    /// Rows carry no padding, so implementations must set the unpack
    /// alignment to one byte before uploading.
    fn upload_texture_r8(&self, texture: TextureId, width: u32, height: u32, pixels: &[u8]);

    /// Apply wrapping and filtering state to a texture
    fn set_sampler(&self, texture: TextureId, sampler: SamplerSettings);

    /// Bind a texture to the given texture unit
    fn bind_texture(&self, unit: u32, texture: TextureId);

    /// Release a texture object
    fn delete_texture(&self, texture: TextureId);

    /// Create an empty buffer object
    fn create_buffer(&self) -> BackendResult<BufferId>;

    /// Allocate `size_bytes` of storage with a dynamic-draw usage hint
    fn allocate_dynamic_buffer(&self, buffer: BufferId, size_bytes: usize);

    /// Overwrite part of a buffer starting at `offset_bytes`
    fn write_buffer(&self, buffer: BufferId, offset_bytes: usize, data: &[f32]);

    /// Release a buffer object
    fn delete_buffer(&self, buffer: BufferId);

    /// Create a vertex array describing one interleaved float attribute in `buffer`
    fn create_vertex_array(&self, buffer: BufferId, layout: VertexLayout) -> BackendResult<VertexArrayId>;

    /// Release a vertex array object
    fn delete_vertex_array(&self, vertex_array: VertexArrayId);

    /// Compile one shader stage.
    ///
    /// On failure the shader object is already released and the compiler log
    /// is returned.
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderId, String>;

    /// Release a shader stage object
    fn delete_shader(&self, shader: ShaderId);

    /// Link shader stages into a program.
    ///
    /// On failure the program object is already released and never made
    /// current; the linker log is returned.
    fn link_program(&self, shaders: &[ShaderId]) -> Result<ProgramId, String>;

    /// Release a program object
    fn delete_program(&self, program: ProgramId);

    /// Make a program current, or unbind with `None`
    fn use_program(&self, program: Option<ProgramId>);

    /// Upload a 4x4 matrix uniform (column-major, no transpose)
    fn set_uniform_mat4(&self, program: ProgramId, name: &str, value: &Mat4);

    /// Upload a 3-component float uniform
    fn set_uniform_vec3(&self, program: ProgramId, name: &str, value: &Vec3);

    /// Upload an integer uniform
    fn set_uniform_i32(&self, program: ProgramId, name: &str, value: i32);

    /// Enable blending with `SRC_ALPHA, ONE_MINUS_SRC_ALPHA`
    fn enable_alpha_blending(&self);

    /// Set the viewport to cover `width` x `height` pixels from the origin
    fn set_viewport(&self, width: u32, height: u32);

    /// Clear the color buffer
    fn clear(&self, color: [f32; 4]);

    /// Draw `vertex_count` vertices from `vertex_array` as a triangle list
    fn draw_triangles(&self, vertex_array: VertexArrayId, vertex_count: u32);
}
