//! Shader management and compilation
//!
//! GLSL source loading and program linking following RAII patterns. Stage
//! objects only live for the duration of a link; the linked program is owned
//! by [`ShaderProgram`] and released when it is dropped.

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::foundation::math::{Mat4, Vec3};
use crate::render::api::{GraphicsDevice, ProgramId, ShaderId, ShaderStage};

/// Result type for shader operations
pub type ShaderResult<T> = Result<T, ShaderError>;

/// Errors raised while building a shader program
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    /// A stage was rejected by the GPU compiler
    #[error("Failed to compile {stage} shader: {log}")]
    CompileError {
        /// Stage that failed
        stage: ShaderStage,
        /// Diagnostic text from the compiler
        log: String,
    },

    /// The stages could not be linked into a program
    #[error("Failed to link shader program: {log}")]
    LinkError {
        /// Diagnostic text from the linker
        log: String,
    },

    /// Shader source could not be read from disk
    #[error("Failed to read shader source '{}': {source}", path.display())]
    SourceIo {
        /// File that could not be read
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
}

/// GLSL source text for a vertex + fragment pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    /// Vertex stage source
    pub vertex: String,
    /// Fragment stage source
    pub fragment: String,
}

impl ShaderSources {
    /// Create from in-memory source strings
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Load both stages from files
    pub fn from_files(vertex_path: impl AsRef<Path>, fragment_path: impl AsRef<Path>) -> ShaderResult<Self> {
        Ok(Self {
            vertex: read_source(vertex_path.as_ref())?,
            fragment: read_source(fragment_path.as_ref())?,
        })
    }
}

fn read_source(path: &Path) -> ShaderResult<String> {
    log::debug!("Loading shader source from {}", path.display());
    std::fs::read_to_string(path).map_err(|source| ShaderError::SourceIo {
        path: path.to_path_buf(),
        source,
    })
}

/// Compiled shader stage, released when dropped
struct Shader {
    device: Rc<dyn GraphicsDevice>,
    id: ShaderId,
}

impl Shader {
    fn compile(device: &Rc<dyn GraphicsDevice>, stage: ShaderStage, source: &str) -> ShaderResult<Self> {
        let id = device.compile_shader(stage, source).map_err(|diagnostic| {
            log::error!("{} shader compilation failed:\n{}", stage, diagnostic);
            ShaderError::CompileError { stage, log: diagnostic }
        })?;

        Ok(Self {
            device: Rc::clone(device),
            id,
        })
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.device.delete_shader(self.id);
    }
}

/// Linked shader program with RAII cleanup
pub struct ShaderProgram {
    device: Rc<dyn GraphicsDevice>,
    id: ProgramId,
}

impl ShaderProgram {
    /// Compile both stages and link them.
    ///
    /// The stage objects are released before this returns, whether linking
    /// succeeded or not. A failed program is never made current.
    pub fn link(device: &Rc<dyn GraphicsDevice>, sources: &ShaderSources) -> ShaderResult<Self> {
        let vertex = Shader::compile(device, ShaderStage::Vertex, &sources.vertex)?;
        let fragment = Shader::compile(device, ShaderStage::Fragment, &sources.fragment)?;

        let id = device.link_program(&[vertex.id, fragment.id]).map_err(|diagnostic| {
            log::error!("Shader program link failed:\n{}", diagnostic);
            ShaderError::LinkError { log: diagnostic }
        })?;

        log::debug!("Linked shader program {}", id.raw());

        Ok(Self {
            device: Rc::clone(device),
            id,
        })
    }

    /// Make this program current
    pub fn bind(&self) {
        self.device.use_program(Some(self.id));
    }

    /// Upload a 4x4 matrix uniform
    pub fn set_mat4(&self, name: &str, value: &Mat4) {
        self.device.set_uniform_mat4(self.id, name, value);
    }

    /// Upload a 3-component float uniform
    pub fn set_vec3(&self, name: &str, value: &Vec3) {
        self.device.set_uniform_vec3(self.id, name, value);
    }

    /// Upload an integer uniform
    pub fn set_i32(&self, name: &str, value: i32) {
        self.device.set_uniform_i32(self.id, name, value);
    }

    /// Get the program handle
    pub fn handle(&self) -> ProgramId {
        self.id
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.device.delete_program(self.id);
    }
}

impl fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::{RecordingDevice, UniformValue};

    fn recording() -> (Rc<RecordingDevice>, Rc<dyn GraphicsDevice>) {
        let recorder = Rc::new(RecordingDevice::new());
        let device: Rc<dyn GraphicsDevice> = recorder.clone();
        (recorder, device)
    }

    fn sources() -> ShaderSources {
        ShaderSources::new("void main() {}", "void main() {}")
    }

    #[test]
    fn test_stages_released_after_link() {
        let (recorder, device) = recording();
        let program = ShaderProgram::link(&device, &sources()).unwrap();

        assert_eq!(recorder.live_shaders(), 0);
        assert_eq!(recorder.live_programs(), 1);

        drop(program);
        assert_eq!(recorder.live_programs(), 0);
    }

    #[test]
    fn test_compile_error_carries_log_and_releases_vertex_stage() {
        let (recorder, device) = recording();
        recorder.fail_compile(ShaderStage::Fragment, "ERROR: 0:3: 'colour' : undeclared identifier");

        let err = ShaderProgram::link(&device, &sources()).unwrap_err();
        match err {
            ShaderError::CompileError { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(log.contains("undeclared identifier"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(recorder.live_objects(), 0);
    }

    #[test]
    fn test_link_error_leaves_nothing_bound() {
        let (recorder, device) = recording();
        recorder.fail_link("error: vertex output 'TexCoords' not read by fragment shader");

        let err = ShaderProgram::link(&device, &sources()).unwrap_err();
        assert!(matches!(err, ShaderError::LinkError { ref log } if log.contains("TexCoords")));
        assert_eq!(recorder.current_program(), None);
        assert_eq!(recorder.live_objects(), 0);
    }

    #[test]
    fn test_uniform_upload() {
        let (recorder, device) = recording();
        let program = ShaderProgram::link(&device, &sources()).unwrap();
        program.set_i32("text", 0);
        assert_eq!(recorder.uniform(program.handle(), "text"), Some(UniformValue::Int(0)));
    }

    #[test]
    fn test_missing_source_file() {
        let err = ShaderSources::from_files("does/not/exist.vert", "does/not/exist.frag").unwrap_err();
        assert!(matches!(err, ShaderError::SourceIo { .. }));
    }
}
