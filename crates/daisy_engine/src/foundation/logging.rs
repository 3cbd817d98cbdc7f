//! Logging setup and re-exports

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system.
///
/// Respects `RUST_LOG`; defaults to `info` when unset.
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
