//! Headless graphics device that records every call
//!
//! `RecordingDevice` keeps track of object lifetimes, buffer contents and
//! uniform values in memory. It lets the text pipeline run without a window or
//! GPU, which is how the renderer tests observe draw calls and quad geometry.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;

use super::device::{
    BackendError, BackendResult, BufferId, GraphicsDevice, ProgramId, SamplerSettings, ShaderId,
    ShaderStage, TextureId, VertexArrayId, VertexLayout,
};
use crate::foundation::math::{Mat4, Vec3};

/// Uniform value captured by the recording device
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// 4x4 matrix
    Mat4(Mat4),
    /// 3-component vector
    Vec3(Vec3),
    /// Integer
    Int(i32),
}

/// A single draw submission
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    /// Program current at submission time
    pub program: Option<ProgramId>,
    /// Texture bound to unit 0 at submission time
    pub texture: Option<TextureId>,
    /// Vertex array used for the draw
    pub vertex_array: VertexArrayId,
    /// Number of vertices submitted
    pub vertex_count: u32,
    /// Contents of the backing buffer at submission time
    pub vertices: Vec<f32>,
}

/// Texture upload as seen by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureUpload {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Raw pixel data
    pub pixels: Vec<u8>,
}

#[derive(Default)]
struct RecordingState {
    next_id: u32,
    textures: HashSet<TextureId>,
    buffers: HashMap<BufferId, Vec<f32>>,
    vertex_arrays: HashMap<VertexArrayId, (BufferId, VertexLayout)>,
    shaders: HashSet<ShaderId>,
    programs: HashSet<ProgramId>,
    uploads: HashMap<TextureId, TextureUpload>,
    samplers: HashMap<TextureId, SamplerSettings>,
    uniforms: HashMap<(ProgramId, String), UniformValue>,
    bound_textures: HashMap<u32, TextureId>,
    current_program: Option<ProgramId>,
    blending: bool,
    viewport: Option<(u32, u32)>,
    draws: Vec<DrawRecord>,
    compile_failure: Option<(ShaderStage, String)>,
    link_failure: Option<String>,
    texture_budget: Option<usize>,
}

impl RecordingState {
    fn allocate(&mut self) -> NonZeroU32 {
        self.next_id += 1;
        NonZeroU32::MIN.saturating_add(self.next_id - 1)
    }
}

/// Graphics device that records calls instead of talking to a GPU
#[derive(Default)]
pub struct RecordingDevice {
    state: RefCell<RecordingState>,
}

impl RecordingDevice {
    /// Create an empty recording device
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next compile of `stage` fail with `log`
    pub fn fail_compile(&self, stage: ShaderStage, log: impl Into<String>) {
        self.state.borrow_mut().compile_failure = Some((stage, log.into()));
    }

    /// Make the next link fail with `log`
    pub fn fail_link(&self, log: impl Into<String>) {
        self.state.borrow_mut().link_failure = Some(log.into());
    }

    /// Refuse texture creation once `count` textures are alive
    pub fn limit_textures(&self, count: usize) {
        self.state.borrow_mut().texture_budget = Some(count);
    }

    /// All draws submitted so far
    pub fn draws(&self) -> Vec<DrawRecord> {
        self.state.borrow().draws.clone()
    }

    /// Forget recorded draws, keeping object state
    pub fn clear_draws(&self) {
        self.state.borrow_mut().draws.clear();
    }

    /// Last value uploaded to a named uniform of `program`
    pub fn uniform(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        self.state
            .borrow()
            .uniforms
            .get(&(program, name.to_string()))
            .cloned()
    }

    /// Data last uploaded to a texture
    pub fn texture_upload(&self, texture: TextureId) -> Option<TextureUpload> {
        self.state.borrow().uploads.get(&texture).cloned()
    }

    /// Sampler state last applied to a texture
    pub fn sampler(&self, texture: TextureId) -> Option<SamplerSettings> {
        self.state.borrow().samplers.get(&texture).copied()
    }

    /// Current size of a buffer's storage in floats
    pub fn buffer_len(&self, buffer: BufferId) -> Option<usize> {
        self.state.borrow().buffers.get(&buffer).map(Vec::len)
    }

    /// Number of texture objects not yet released
    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    /// Number of buffer objects not yet released
    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    /// Number of vertex arrays not yet released
    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    /// Number of shader stage objects not yet released
    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    /// Number of programs not yet released
    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    /// Total number of live objects of every kind
    pub fn live_objects(&self) -> usize {
        self.live_textures()
            + self.live_buffers()
            + self.live_vertex_arrays()
            + self.live_shaders()
            + self.live_programs()
    }

    /// Program currently in use
    pub fn current_program(&self) -> Option<ProgramId> {
        self.state.borrow().current_program
    }

    /// Whether alpha blending was enabled
    pub fn blending_enabled(&self) -> bool {
        self.state.borrow().blending
    }

    /// Last viewport set on the device
    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.state.borrow().viewport
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_texture(&self) -> BackendResult<TextureId> {
        let mut state = self.state.borrow_mut();
        if state.texture_budget.is_some_and(|budget| state.textures.len() >= budget) {
            return Err(BackendError::CreationFailed {
                kind: "texture",
                reason: "out of texture memory".to_string(),
            });
        }
        let id = TextureId(state.allocate());
        state.textures.insert(id);
        Ok(id)
    }

    fn upload_texture_r8(&self, texture: TextureId, width: u32, height: u32, pixels: &[u8]) {
        self.state.borrow_mut().uploads.insert(
            texture,
            TextureUpload {
                width,
                height,
                pixels: pixels.to_vec(),
            },
        );
    }

    fn set_sampler(&self, texture: TextureId, sampler: SamplerSettings) {
        self.state.borrow_mut().samplers.insert(texture, sampler);
    }

    fn bind_texture(&self, unit: u32, texture: TextureId) {
        self.state.borrow_mut().bound_textures.insert(unit, texture);
    }

    fn delete_texture(&self, texture: TextureId) {
        let mut state = self.state.borrow_mut();
        state.textures.remove(&texture);
        state.uploads.remove(&texture);
        state.samplers.remove(&texture);
    }

    fn create_buffer(&self) -> BackendResult<BufferId> {
        let mut state = self.state.borrow_mut();
        let id = BufferId(state.allocate());
        state.buffers.insert(id, Vec::new());
        Ok(id)
    }

    fn allocate_dynamic_buffer(&self, buffer: BufferId, size_bytes: usize) {
        if let Some(storage) = self.state.borrow_mut().buffers.get_mut(&buffer) {
            *storage = vec![0.0; size_bytes / std::mem::size_of::<f32>()];
        }
    }

    fn write_buffer(&self, buffer: BufferId, offset_bytes: usize, data: &[f32]) {
        if let Some(storage) = self.state.borrow_mut().buffers.get_mut(&buffer) {
            let start = offset_bytes / std::mem::size_of::<f32>();
            let end = (start + data.len()).min(storage.len());
            if start < end {
                storage[start..end].copy_from_slice(&data[..end - start]);
            }
        }
    }

    fn delete_buffer(&self, buffer: BufferId) {
        self.state.borrow_mut().buffers.remove(&buffer);
    }

    fn create_vertex_array(&self, buffer: BufferId, layout: VertexLayout) -> BackendResult<VertexArrayId> {
        let mut state = self.state.borrow_mut();
        if !state.buffers.contains_key(&buffer) {
            return Err(BackendError::InvalidArgument(format!(
                "buffer {} does not exist",
                buffer.raw()
            )));
        }
        let id = VertexArrayId(state.allocate());
        state.vertex_arrays.insert(id, (buffer, layout));
        Ok(id)
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        self.state.borrow_mut().vertex_arrays.remove(&vertex_array);
    }

    fn compile_shader(&self, stage: ShaderStage, _source: &str) -> Result<ShaderId, String> {
        let mut state = self.state.borrow_mut();
        if let Some((failing_stage, log)) = state.compile_failure.take() {
            if failing_stage == stage {
                return Err(log);
            }
            state.compile_failure = Some((failing_stage, log));
        }
        let id = ShaderId(state.allocate());
        state.shaders.insert(id);
        Ok(id)
    }

    fn delete_shader(&self, shader: ShaderId) {
        self.state.borrow_mut().shaders.remove(&shader);
    }

    fn link_program(&self, shaders: &[ShaderId]) -> Result<ProgramId, String> {
        let mut state = self.state.borrow_mut();
        if let Some(log) = state.link_failure.take() {
            return Err(log);
        }
        if let Some(missing) = shaders.iter().find(|shader| !state.shaders.contains(shader)) {
            return Err(format!("shader {} is not a compiled shader object", missing.raw()));
        }
        let id = ProgramId(state.allocate());
        state.programs.insert(id);
        Ok(id)
    }

    fn delete_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        state.uniforms.retain(|(owner, _), _| *owner != program);
        if state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn use_program(&self, program: Option<ProgramId>) {
        self.state.borrow_mut().current_program = program;
    }

    fn set_uniform_mat4(&self, program: ProgramId, name: &str, value: &Mat4) {
        self.state
            .borrow_mut()
            .uniforms
            .insert((program, name.to_string()), UniformValue::Mat4(*value));
    }

    fn set_uniform_vec3(&self, program: ProgramId, name: &str, value: &Vec3) {
        self.state
            .borrow_mut()
            .uniforms
            .insert((program, name.to_string()), UniformValue::Vec3(*value));
    }

    fn set_uniform_i32(&self, program: ProgramId, name: &str, value: i32) {
        self.state
            .borrow_mut()
            .uniforms
            .insert((program, name.to_string()), UniformValue::Int(value));
    }

    fn enable_alpha_blending(&self) {
        self.state.borrow_mut().blending = true;
    }

    fn set_viewport(&self, width: u32, height: u32) {
        self.state.borrow_mut().viewport = Some((width, height));
    }

    fn clear(&self, _color: [f32; 4]) {}

    fn draw_triangles(&self, vertex_array: VertexArrayId, vertex_count: u32) {
        let mut state = self.state.borrow_mut();
        let vertices = state
            .vertex_arrays
            .get(&vertex_array)
            .and_then(|(buffer, _)| state.buffers.get(buffer))
            .cloned()
            .unwrap_or_default();
        let record = DrawRecord {
            program: state.current_program,
            texture: state.bound_textures.get(&0).copied(),
            vertex_array,
            vertex_count,
            vertices,
        };
        state.draws.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objects_are_tracked_until_deleted() {
        let device = RecordingDevice::new();
        let texture = device.create_texture().unwrap();
        let buffer = device.create_buffer().unwrap();
        assert_eq!(device.live_objects(), 2);

        device.delete_texture(texture);
        device.delete_buffer(buffer);
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn test_handles_are_unique() {
        let device = RecordingDevice::new();
        let a = device.create_texture().unwrap();
        let b = device.create_texture().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_draw_captures_buffer_contents() {
        let device = RecordingDevice::new();
        let buffer = device.create_buffer().unwrap();
        device.allocate_dynamic_buffer(buffer, 4 * std::mem::size_of::<f32>());
        let layout = VertexLayout { location: 0, components: 4 };
        let vao = device.create_vertex_array(buffer, layout).unwrap();

        device.write_buffer(buffer, 0, &[1.0, 2.0, 3.0, 4.0]);
        device.draw_triangles(vao, 1);
        device.write_buffer(buffer, 0, &[5.0, 6.0, 7.0, 8.0]);

        let draws = device.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].vertices, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_scripted_compile_failure_only_hits_matching_stage() {
        let device = RecordingDevice::new();
        device.fail_compile(ShaderStage::Fragment, "0:1: syntax error");

        assert!(device.compile_shader(ShaderStage::Vertex, "").is_ok());
        let err = device.compile_shader(ShaderStage::Fragment, "").unwrap_err();
        assert_eq!(err, "0:1: syntax error");
        // Failure is consumed
        assert!(device.compile_shader(ShaderStage::Fragment, "").is_ok());
    }

    #[test]
    fn test_texture_budget() {
        let device = RecordingDevice::new();
        device.limit_textures(1);
        assert!(device.create_texture().is_ok());
        assert!(matches!(
            device.create_texture(),
            Err(BackendError::CreationFailed { kind: "texture", .. })
        ));
    }
}
