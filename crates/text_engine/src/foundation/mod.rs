//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types used by layout and projection
//! - Logging utilities

pub mod math;
pub mod logging;
