//! Public rendering API
//!
//! Backend-agnostic device trait, opaque GPU handles, and a headless
//! recording implementation.

pub mod device;
pub mod recording;

pub use device::*;
pub use recording::{DrawRecord, RecordingDevice, TextureUpload, UniformValue};
