//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Honors `RUST_LOG` and falls back to `info` when it is not set.
pub fn init() {
    init_with_level("info");
}

/// Initialize the logging system with a default filter
///
/// `default_level` is used only when `RUST_LOG` is unset, so the environment
/// always wins over configuration files.
pub fn init_with_level(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    // A second initialisation (e.g. from tests) is not an error worth surfacing
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialised, keeping existing configuration");
    }
}
