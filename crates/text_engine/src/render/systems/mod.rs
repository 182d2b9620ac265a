//! Rendering systems built on the device abstraction

pub mod text;
