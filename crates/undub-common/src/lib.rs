//! Common configuration and types shared across the undub crates

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extension carried by stream containers (without the dot)
pub const DEFAULT_EXTENSION: &str = "sdt";

/// Audio formats substituted by default
pub const DEFAULT_AUDIO_FORMATS: &[&str] = &["vag", "xwma"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// How the decoder treats a container that ends without an end marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Accept the container, log a warning
    #[default]
    Lenient,
    /// Reject the container
    Strict,
}

impl Strictness {
    pub fn from_flag(strict: bool) -> Self {
        if strict {
            Strictness::Strict
        } else {
            Strictness::Lenient
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Strictness::Strict)
    }
}

/// Configuration for an undub run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UndubConfig {
    /// Tree holding the containers whose audio is kept
    pub source_root: Option<PathBuf>,
    /// Tree whose structure (video, subtitles) is kept
    pub target_root: Option<PathBuf>,
    /// Where stitched containers are written
    pub output_root: Option<PathBuf>,
    /// Container extension, without the leading dot
    pub extension: String,
    /// Format tags treated as substitutable audio
    pub audio_formats: Vec<String>,
    /// Reject containers missing their end marker
    pub strict: bool,
    pub log_level: String,
}

impl Default for UndubConfig {
    fn default() -> Self {
        Self {
            source_root: None,
            target_root: None,
            output_root: None,
            extension: DEFAULT_EXTENSION.to_string(),
            audio_formats: DEFAULT_AUDIO_FORMATS.iter().map(|s| s.to_string()).collect(),
            strict: false,
            log_level: "info".to_string(),
        }
    }
}

impl UndubConfig {
    /// Load a config from a TOML file; missing keys take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn strictness(&self) -> Strictness {
        Strictness::from_flag(self.strict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = UndubConfig::default();
        assert_eq!(config.extension, "sdt");
        assert_eq!(config.audio_formats, vec!["vag", "xwma"]);
        assert_eq!(config.strictness(), Strictness::Lenient);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = UndubConfig::from_toml(
            r#"
            strict = true
            audio_formats = ["vag", "msf"]
            output_root = "out"
            "#,
        )
        .unwrap();
        assert!(config.strictness().is_strict());
        assert_eq!(config.audio_formats, vec!["vag", "msf"]);
        assert_eq!(config.output_root, Some(PathBuf::from("out")));
        assert_eq!(config.extension, "sdt");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_bad_toml_is_error() {
        assert!(UndubConfig::from_toml("strict = \"maybe\"").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = UndubConfig::load("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
