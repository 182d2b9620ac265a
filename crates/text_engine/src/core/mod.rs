//! # Core Module
//!
//! Shared settings for the text pipeline and the demo application.

pub mod config;

pub use config::{Config, ConfigError, ConfigResult, FontConfig, ShaderConfig, TextConfig, WindowConfig};
