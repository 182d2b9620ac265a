//! Math utilities and types
//!
//! Thin aliases over `nalgebra` so the text pipeline speaks in the same
//! types as the rest of the engine.

pub use nalgebra::{Matrix4, Vector2, Vector3};

/// 2D vector type (pixel positions, pen coordinates)
pub type Vec2 = Vector2<f32>;

/// 3D vector type (RGB colors)
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Linear RGB color with components in the 0.0-1.0 range
pub type Rgb = Vector3<f32>;

/// Commonly used text colors
pub mod colors {
    use super::Rgb;

    /// Pure white
    pub fn white() -> Rgb {
        Rgb::new(1.0, 1.0, 1.0)
    }

    /// Pure black
    pub fn black() -> Rgb {
        Rgb::new(0.0, 0.0, 0.0)
    }
}
