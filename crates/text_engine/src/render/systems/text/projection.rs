//! Orthographic projection for screen-space text
//!
//! Maps pixel coordinates (origin bottom-left, +Y up) to normalized device
//! coordinates. Recomputed whenever the viewport changes size.

use crate::foundation::math::Mat4;

/// Compute an OpenGL-style orthographic projection matrix.
///
/// The caller guarantees `right != left`, `top != bottom` and `far != near`;
/// otherwise the result contains non-finite values.
///
/// ```text
/// [ 2/(r-l)   0         0          -(r+l)/(r-l) ]
/// [ 0         2/(t-b)   0          -(t+b)/(t-b) ]
/// [ 0         0         -2/(f-n)   -(f+n)/(f-n) ]
/// [ 0         0         0           1           ]
/// ```
pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = far - near;

    let mut result = Mat4::zeros();

    result[(0, 0)] = 2.0 / width;
    result[(1, 1)] = 2.0 / height;
    result[(2, 2)] = -2.0 / depth;
    result[(3, 3)] = 1.0;

    result[(0, 3)] = -(right + left) / width;
    result[(1, 3)] = -(top + bottom) / height;
    result[(2, 3)] = -(far + near) / depth;

    result
}

/// Projection covering a `width` x `height` pixel viewport with depth range 0..1
pub fn viewport_projection(width: u32, height: u32) -> Mat4 {
    orthographic(0.0, width as f32, 0.0, height as f32, 0.0, 1.0)
}
