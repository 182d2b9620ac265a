//! GPU object wrappers with RAII cleanup
//!
//! Each wrapper keeps a shared reference to the device that created it and
//! releases its object when dropped, so early returns during initialisation
//! never leak handles.

use std::fmt;
use std::rc::Rc;

use crate::render::api::{
    BackendError, BackendResult, BufferId, GraphicsDevice, SamplerSettings, TextureId, VertexArrayId,
    VertexLayout,
};

/// Texture object wrapper with RAII cleanup
pub struct Texture {
    device: Rc<dyn GraphicsDevice>,
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    /// Create a single-channel texture from a tightly packed 8-bit bitmap.
    ///
    /// `pixels` must hold exactly `width * height` bytes; nothing is created
    /// otherwise.
    pub fn from_r8(
        device: &Rc<dyn GraphicsDevice>,
        width: u32,
        height: u32,
        pixels: &[u8],
        sampler: SamplerSettings,
    ) -> BackendResult<Self> {
        let expected = r8_len(width, height);
        if expected != Some(pixels.len()) {
            return Err(BackendError::InvalidArgument(format!(
                "{}x{} R8 texture needs {} bytes, got {}",
                width,
                height,
                u64::from(width) * u64::from(height),
                pixels.len()
            )));
        }

        let id = device.create_texture()?;
        let texture = Self {
            device: Rc::clone(device),
            id,
            width,
            height,
        };

        device.upload_texture_r8(id, width, height, pixels);
        device.set_sampler(id, sampler);

        Ok(texture)
    }

    /// Get the texture handle
    pub fn handle(&self) -> TextureId {
        self.id
    }

    /// Texture dimensions in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bind this texture to a texture unit
    pub fn bind(&self, unit: u32) {
        self.device.bind_texture(unit, self.id);
    }
}

/// Byte length of a tightly packed `width x height` single-channel image
pub fn r8_len(width: u32, height: u32) -> Option<usize> {
    usize::try_from(width).ok()?.checked_mul(usize::try_from(height).ok()?)
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.device.delete_texture(self.id);
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Dynamically updated vertex buffer with RAII cleanup
pub struct VertexBuffer {
    device: Rc<dyn GraphicsDevice>,
    id: BufferId,
    size_bytes: usize,
}

impl VertexBuffer {
    /// Allocate a buffer of `size_bytes` intended for frequent overwrites
    pub fn dynamic(device: &Rc<dyn GraphicsDevice>, size_bytes: usize) -> BackendResult<Self> {
        let id = device.create_buffer()?;
        device.allocate_dynamic_buffer(id, size_bytes);

        Ok(Self {
            device: Rc::clone(device),
            id,
            size_bytes,
        })
    }

    /// Replace the buffer contents starting at the first byte.
    ///
    /// Writes that would overrun the allocation are truncated to fit.
    pub fn write(&self, data: &[f32]) {
        let capacity = self.size_bytes / std::mem::size_of::<f32>();
        if data.len() > capacity {
            log::warn!(
                "Vertex data ({} floats) exceeds buffer capacity ({} floats), truncating",
                data.len(),
                capacity
            );
        }
        self.device.write_buffer(self.id, 0, &data[..data.len().min(capacity)]);
    }

    /// Get the buffer handle
    pub fn handle(&self) -> BufferId {
        self.id
    }

    /// Allocated size in bytes
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        self.device.delete_buffer(self.id);
    }
}

/// Vertex array object with RAII cleanup
pub struct VertexArray {
    device: Rc<dyn GraphicsDevice>,
    id: VertexArrayId,
    layout: VertexLayout,
}

impl VertexArray {
    /// Describe `layout` as the only attribute sourced from `buffer`
    pub fn new(
        device: &Rc<dyn GraphicsDevice>,
        buffer: &VertexBuffer,
        layout: VertexLayout,
    ) -> BackendResult<Self> {
        let id = device.create_vertex_array(buffer.handle(), layout)?;

        Ok(Self {
            device: Rc::clone(device),
            id,
            layout,
        })
    }

    /// Submit `vertex_count` vertices as a triangle list
    pub fn draw_triangles(&self, vertex_count: u32) {
        self.device.draw_triangles(self.id, vertex_count);
    }

    /// Get the vertex array handle
    pub fn handle(&self) -> VertexArrayId {
        self.id
    }

    /// Attribute layout
    pub fn layout(&self) -> VertexLayout {
        self.layout
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        self.device.delete_vertex_array(self.id);
    }
}
