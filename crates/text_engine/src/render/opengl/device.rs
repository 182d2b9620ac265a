//! OpenGL implementation of [`GraphicsDevice`] via `glow`
//!
//! Every call issues raw GL commands against the context that was current
//! when the device was created. The device must only be used from the thread
//! that owns that context.

#![allow(unsafe_code)]

use glow::HasContext;

use crate::foundation::math::{Mat4, Vec3};
use crate::render::resources::gpu::r8_len;
use crate::render::api::{
    BackendError, BackendResult, BufferId, FilterMode, GraphicsDevice, ProgramId, SamplerSettings,
    ShaderId, ShaderStage, TextureId, VertexArrayId, VertexLayout, WrapMode,
};

/// OpenGL device wrapping a `glow` context
pub struct GlowDevice {
    gl: glow::Context,
}

impl GlowDevice {
    /// Wrap an already loaded `glow` context
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    /// Load GL function pointers with a platform loader.
    ///
    /// # Safety
    /// An OpenGL context must be current on this thread and `loader` must
    /// return valid function pointers for it.
    pub unsafe fn from_loader<F>(loader: F) -> Self
    where
        F: FnMut(&str) -> *const std::os::raw::c_void,
    {
        Self::new(glow::Context::from_loader_function(loader))
    }

    /// Version string reported by the driver
    pub fn version_string(&self) -> String {
        unsafe { self.gl.get_parameter_string(glow::VERSION) }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<glow::NativeUniformLocation> {
        let location = unsafe { self.gl.get_uniform_location(native_program(program), name) };
        if location.is_none() {
            log::trace!("Uniform '{}' not active in program {}", name, program.raw());
        }
        location
    }
}

fn native_texture(id: TextureId) -> glow::NativeTexture {
    glow::NativeTexture(id.0)
}

fn native_buffer(id: BufferId) -> glow::NativeBuffer {
    glow::NativeBuffer(id.0)
}

fn native_vertex_array(id: VertexArrayId) -> glow::NativeVertexArray {
    glow::NativeVertexArray(id.0)
}

fn native_shader(id: ShaderId) -> glow::NativeShader {
    glow::NativeShader(id.0)
}

fn native_program(id: ProgramId) -> glow::NativeProgram {
    glow::NativeProgram(id.0)
}

fn creation_failed(kind: &'static str) -> impl FnOnce(String) -> BackendError {
    move |reason| BackendError::CreationFailed { kind, reason }
}

fn gl_wrap(mode: WrapMode) -> i32 {
    match mode {
        WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE as i32,
        WrapMode::Repeat => glow::REPEAT as i32,
    }
}

fn gl_filter(mode: FilterMode) -> i32 {
    match mode {
        FilterMode::Linear => glow::LINEAR as i32,
        FilterMode::Nearest => glow::NEAREST as i32,
    }
}

fn gl_size(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl GraphicsDevice for GlowDevice {
    fn create_texture(&self) -> BackendResult<TextureId> {
        let texture = unsafe { self.gl.create_texture() }.map_err(creation_failed("texture"))?;
        Ok(TextureId(texture.0))
    }

    fn upload_texture_r8(&self, texture: TextureId, width: u32, height: u32, pixels: &[u8]) {
        // GL reads width * height bytes from the slice
        if r8_len(width, height) != Some(pixels.len()) {
            log::error!(
                "Refusing {}x{} R8 upload from {} bytes to texture {}",
                width,
                height,
                pixels.len(),
                texture.raw()
            );
            return;
        }

        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(native_texture(texture)));
            // Glyph bitmaps are byte-packed with no row padding
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RED as i32,
                gl_size(width as usize),
                gl_size(height as usize),
                0,
                glow::RED,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            );
        }
    }

    fn set_sampler(&self, texture: TextureId, sampler: SamplerSettings) {
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(native_texture(texture)));
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, gl_wrap(sampler.wrap_s));
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, gl_wrap(sampler.wrap_t));
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, gl_filter(sampler.min_filter));
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, gl_filter(sampler.mag_filter));
        }
    }

    fn bind_texture(&self, unit: u32, texture: TextureId) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(native_texture(texture)));
        }
    }

    fn delete_texture(&self, texture: TextureId) {
        unsafe { self.gl.delete_texture(native_texture(texture)) }
    }

    fn create_buffer(&self) -> BackendResult<BufferId> {
        let buffer = unsafe { self.gl.create_buffer() }.map_err(creation_failed("buffer"))?;
        Ok(BufferId(buffer.0))
    }

    fn allocate_dynamic_buffer(&self, buffer: BufferId, size_bytes: usize) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(native_buffer(buffer)));
            self.gl.buffer_data_size(glow::ARRAY_BUFFER, gl_size(size_bytes), glow::DYNAMIC_DRAW);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn write_buffer(&self, buffer: BufferId, offset_bytes: usize, data: &[f32]) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(native_buffer(buffer)));
            self.gl.buffer_sub_data_u8_slice(
                glow::ARRAY_BUFFER,
                gl_size(offset_bytes),
                bytemuck::cast_slice(data),
            );
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn delete_buffer(&self, buffer: BufferId) {
        unsafe { self.gl.delete_buffer(native_buffer(buffer)) }
    }

    fn create_vertex_array(&self, buffer: BufferId, layout: VertexLayout) -> BackendResult<VertexArrayId> {
        unsafe {
            let vertex_array = self.gl.create_vertex_array().map_err(creation_failed("vertex array"))?;
            self.gl.bind_vertex_array(Some(vertex_array));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(native_buffer(buffer)));
            self.gl.enable_vertex_attrib_array(layout.location);
            self.gl.vertex_attrib_pointer_f32(
                layout.location,
                gl_size(layout.components as usize),
                glow::FLOAT,
                false,
                gl_size(layout.stride_bytes()),
                0,
            );
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
            self.gl.bind_vertex_array(None);
            Ok(VertexArrayId(vertex_array.0))
        }
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        unsafe { self.gl.delete_vertex_array(native_vertex_array(vertex_array)) }
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };

        unsafe {
            let shader = self.gl.create_shader(kind)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);

            if self.gl.get_shader_compile_status(shader) {
                Ok(ShaderId(shader.0))
            } else {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                Err(log)
            }
        }
    }

    fn delete_shader(&self, shader: ShaderId) {
        unsafe { self.gl.delete_shader(native_shader(shader)) }
    }

    fn link_program(&self, shaders: &[ShaderId]) -> Result<ProgramId, String> {
        unsafe {
            let program = self.gl.create_program()?;
            for shader in shaders {
                self.gl.attach_shader(program, native_shader(*shader));
            }
            self.gl.link_program(program);
            for shader in shaders {
                self.gl.detach_shader(program, native_shader(*shader));
            }

            if self.gl.get_program_link_status(program) {
                Ok(ProgramId(program.0))
            } else {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                Err(log)
            }
        }
    }

    fn delete_program(&self, program: ProgramId) {
        unsafe { self.gl.delete_program(native_program(program)) }
    }

    fn use_program(&self, program: Option<ProgramId>) {
        unsafe { self.gl.use_program(program.map(native_program)) }
    }

    fn set_uniform_mat4(&self, program: ProgramId, name: &str, value: &Mat4) {
        let location = self.uniform_location(program, name);
        unsafe {
            self.gl.use_program(Some(native_program(program)));
            // nalgebra storage is column-major, matching GL's expectation
            self.gl.uniform_matrix_4_f32_slice(location.as_ref(), false, value.as_slice());
        }
    }

    fn set_uniform_vec3(&self, program: ProgramId, name: &str, value: &Vec3) {
        let location = self.uniform_location(program, name);
        unsafe {
            self.gl.use_program(Some(native_program(program)));
            self.gl.uniform_3_f32(location.as_ref(), value.x, value.y, value.z);
        }
    }

    fn set_uniform_i32(&self, program: ProgramId, name: &str, value: i32) {
        let location = self.uniform_location(program, name);
        unsafe {
            self.gl.use_program(Some(native_program(program)));
            self.gl.uniform_1_i32(location.as_ref(), value);
        }
    }

    fn enable_alpha_blending(&self) {
        unsafe {
            self.gl.enable(glow::BLEND);
            self.gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
        }
    }

    fn set_viewport(&self, width: u32, height: u32) {
        unsafe { self.gl.viewport(0, 0, gl_size(width as usize), gl_size(height as usize)) }
    }

    fn clear(&self, color: [f32; 4]) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn draw_triangles(&self, vertex_array: VertexArrayId, vertex_count: u32) {
        unsafe {
            self.gl.bind_vertex_array(Some(native_vertex_array(vertex_array)));
            self.gl.draw_arrays(glow::TRIANGLES, 0, gl_size(vertex_count as usize));
            self.gl.bind_vertex_array(None);
        }
    }
}
