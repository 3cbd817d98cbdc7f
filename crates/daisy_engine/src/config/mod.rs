//! Renderer configuration
//!
//! Loaded from a TOML file when one exists; every field has a default so the
//! demo apps run without any configuration on disk.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file exists but could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`RendererConfig`]
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// Path that failed to parse
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// Compiled shader missing from every search path
    #[error("Shader not found: {name} (searched {searched:?})")]
    ShaderNotFound {
        /// Shader file name that was requested
        name: String,
        /// Candidate paths that were checked
        searched: Vec<PathBuf>,
    },
}

/// Preferred presentation mode for the swapchain.
///
/// Only a preference: the swapchain falls back to FIFO when the surface does
/// not support the requested mode, since FIFO support is guaranteed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentModePreference {
    /// Vsync, always available
    #[default]
    Fifo,
    /// Triple-buffered, low latency without tearing
    Mailbox,
    /// No sync, may tear
    Immediate,
}

/// Renderer configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Window title
    pub window_title: String,
    /// Initial window width in screen coordinates
    pub window_width: u32,
    /// Initial window height in screen coordinates
    pub window_height: u32,
    /// Vertex shader SPIR-V file name
    pub vertex_shader: String,
    /// Fragment shader SPIR-V file name
    pub fragment_shader: String,
    /// Preferred presentation mode
    pub present_mode: PresentModePreference,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window_title: "Daisy Engine".to_string(),
            window_width: 800,
            window_height: 600,
            vertex_shader: "simple_shader.vert.spv".to_string(),
            fragment_shader: "simple_shader.frag.spv".to_string(),
            present_mode: PresentModePreference::Fifo,
        }
    }
}

/// Directories searched for compiled shaders, in priority order.
const SHADER_SEARCH_PATHS: &[&str] = &[
    "target/shaders",
    "cube_app/target/shaders",
    "shaders",
];

impl RendererConfig {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("Loaded renderer config from {}", path.display());
        Ok(config)
    }

    /// Resolve a shader file name against the standard search paths.
    pub fn resolve_shader_path(name: &str) -> Result<PathBuf, ConfigError> {
        // Absolute or relative paths that already resolve win outright
        let direct = PathBuf::from(name);
        if direct.exists() {
            return Ok(direct);
        }

        let searched: Vec<PathBuf> = SHADER_SEARCH_PATHS
            .iter()
            .map(|dir| Path::new(dir).join(name))
            .collect();

        searched
            .iter()
            .find(|candidate| candidate.exists())
            .cloned()
            .ok_or_else(|| ConfigError::ShaderNotFound {
                name: name.to_string(),
                searched,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = RendererConfig::default();
        assert_eq!(config.window_width, 800);
        assert_eq!(config.window_height, 600);
        assert_eq!(config.present_mode, PresentModePreference::Fifo);
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let config = RendererConfig::load("does/not/exist.toml").unwrap();
        assert_eq!(config.window_title, RendererConfig::default().window_title);
    }

    #[test]
    fn parses_partial_config() {
        let parsed: RendererConfig = toml::from_str(
            r#"
            window_title = "Demo"
            window_width = 1280
            present_mode = "mailbox"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.window_title, "Demo");
        assert_eq!(parsed.window_width, 1280);
        assert_eq!(parsed.window_height, 600);
        assert_eq!(parsed.present_mode, PresentModePreference::Mailbox);
    }

    #[test]
    fn rejects_unknown_present_mode() {
        let parsed: Result<RendererConfig, _> = toml::from_str(r#"present_mode = "turbo""#);
        assert!(parsed.is_err());
    }
}
