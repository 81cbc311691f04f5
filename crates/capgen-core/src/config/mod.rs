//! Configuration management for capgen.
//!
//! Configuration is resolved from a precedence chain, highest wins per key:
//!
//! 1. Explicit override path (`--config` flag or `CAPGEN_CONFIG` env var)
//! 2. User config file (`~/.capgen/config.toml` or platform equivalent)
//! 3. Working-directory file (`./capgen.toml`)
//! 4. Built-in defaults
//!
//! Each present file is parsed as a partial overlay; keys it does not set
//! fall through to the next source. A file that cannot be read or parsed is
//! logged as a warning and skipped.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file override.
pub const CONFIG_ENV_VAR: &str = "CAPGEN_CONFIG";

/// Working-directory config file name.
pub const LOCAL_CONFIG_NAME: &str = "capgen.toml";

/// Root configuration structure for capgen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pretrained model settings
    pub models: ModelsConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Partial configuration as read from a single file in the chain.
///
/// Every key is optional so a file can override only what it names.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigOverlay {
    models: ModelsOverlay,
    output: OutputOverlay,
    logging: LoggingOverlay,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelsOverlay {
    caption_model: Option<String>,
    embedding_model: Option<String>,
    /// TOML has no null; an absent key means "keep the lower layer".
    cache_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OutputOverlay {
    dir: Option<PathBuf>,
    mode: Option<String>,
    csv_name: Option<String>,
    max_filename_len: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoggingOverlay {
    level: Option<String>,
    format: Option<String>,
}

impl ConfigOverlay {
    /// Apply this overlay on top of `config`, overriding only present keys.
    fn apply(self, config: &mut Config) {
        if let Some(v) = self.models.caption_model {
            config.models.caption_model = v;
        }
        if let Some(v) = self.models.embedding_model {
            config.models.embedding_model = v;
        }
        if let Some(v) = self.models.cache_dir {
            config.models.cache_dir = Some(v);
        }
        if let Some(v) = self.output.dir {
            config.output.dir = v;
        }
        if let Some(v) = self.output.mode {
            config.output.mode = v;
        }
        if let Some(v) = self.output.csv_name {
            config.output.csv_name = v;
        }
        if let Some(v) = self.output.max_filename_len {
            config.output.max_filename_len = v;
        }
        if let Some(v) = self.logging.level {
            config.logging.level = v;
        }
        if let Some(v) = self.logging.format {
            config.logging.format = v;
        }
    }
}

impl Config {
    /// Load configuration from the full precedence chain.
    ///
    /// Never fails: unreadable or unparsable files are logged and skipped,
    /// and with no files present the built-in defaults are used verbatim.
    pub fn load() -> Self {
        Self::load_with_override(None)
    }

    /// Load configuration with an explicit override path taking highest
    /// precedence (falls back to the `CAPGEN_CONFIG` env var when `None`).
    pub fn load_with_override(override_path: Option<&Path>) -> Self {
        let env_override = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        let explicit = override_path
            .map(Path::to_path_buf)
            .or(env_override);

        let local = PathBuf::from(LOCAL_CONFIG_NAME);
        let user = Self::default_path();

        let mut chain: Vec<&Path> = vec![local.as_path(), user.as_path()];
        if let Some(p) = explicit.as_deref() {
            chain.push(p);
        }
        Self::merge_chain(&chain)
    }

    /// Merge a chain of config files, lowest precedence first.
    fn merge_chain(sources: &[&Path]) -> Self {
        let mut config = Config::default();

        for path in sources {
            if !path.exists() {
                continue;
            }
            match Self::read_overlay(path) {
                Ok(overlay) => {
                    tracing::debug!("Applying config from {:?}", path);
                    overlay.apply(&mut config);
                }
                Err(e) => {
                    tracing::warn!("Failed to load config from {:?}: {e}", path);
                }
            }
        }

        if let Err(e) = config.validate() {
            tracing::warn!("Invalid configuration ({e}), using defaults");
            return Config::default();
        }
        config
    }

    fn read_overlay(path: &Path) -> Result<ConfigOverlay, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let overlay: ConfigOverlay = toml::from_str(&content)?;
        Ok(overlay)
    }

    /// Load configuration from a specific file only (no chain).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the user-level config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.capgen.capgen/config.toml
    /// - Linux: ~/.config/capgen/config.toml
    ///
    /// Falls back to ~/.capgen/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "capgen", "capgen")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".capgen").join("config.toml")
            })
    }

    /// Get the resolved model cache directory (with ~ expansion).
    ///
    /// `models.cache_dir = None` means the default `~/.capgen/models`.
    pub fn model_dir(&self) -> PathBuf {
        let raw = self
            .models
            .cache_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("~/.capgen/models"));
        let raw = raw.to_string_lossy().into_owned();
        let expanded = shellexpand::tilde(&raw);
        PathBuf::from(expanded.into_owned())
    }

    /// Get the resolved output directory (with ~ expansion).
    pub fn output_dir(&self) -> PathBuf {
        let raw = self.output.dir.to_string_lossy().into_owned();
        let expanded = shellexpand::tilde(&raw);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.models.caption_model, "vit-gpt2-image-captioning");
        assert_eq!(config.models.embedding_model, "clip-vit-base-patch32");
        assert!(config.models.cache_dir.is_none());
        assert_eq!(config.output.mode, "csv");
        assert_eq!(config.output.csv_name, "desc.csv");
        assert_eq!(config.output.max_filename_len, 128);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[models]"));
        assert!(toml.contains("[output]"));
        assert!(toml.contains("[logging]"));
    }

    #[test]
    fn test_merge_chain_empty_uses_defaults() {
        let config = Config::merge_chain(&[]);
        assert_eq!(config.models.caption_model, "vit-gpt2-image-captioning");
        assert_eq!(config.output.max_filename_len, 128);
    }

    #[test]
    fn test_higher_layer_wins_and_gaps_fall_through() {
        let dir = tempfile::tempdir().unwrap();
        // Lower layer (working directory) sets two keys.
        let local = write_config(
            dir.path(),
            "capgen.toml",
            "[models]\ncaption_model = \"local-caption\"\n\n[output]\nmax_filename_len = 64\n",
        );
        // Higher layer (user config) overrides one of them.
        let user = write_config(
            dir.path(),
            "user.toml",
            "[models]\ncaption_model = \"user-caption\"\n",
        );

        let config = Config::merge_chain(&[local.as_path(), user.as_path()]);
        // User file takes effect; local-only key fills the gap.
        assert_eq!(config.models.caption_model, "user-caption");
        assert_eq!(config.output.max_filename_len, 64);
        // Untouched keys keep defaults.
        assert_eq!(config.models.embedding_model, "clip-vit-base-patch32");
    }

    #[test]
    fn test_unparsable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_config(
            dir.path(),
            "good.toml",
            "[output]\ncsv_name = \"manifest.csv\"\n",
        );
        let bad = write_config(dir.path(), "bad.toml", "this is { not toml");

        let config = Config::merge_chain(&[good.as_path(), bad.as_path()]);
        assert_eq!(config.output.csv_name, "manifest.csv");
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("nope.toml");
        let config = Config::merge_chain(&[absent.as_path()]);
        assert_eq!(config.output.csv_name, "desc.csv");
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "bad.toml", "[output]\nmax_filename_len = 3\n");
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_model_dir_default() {
        let config = Config::default();
        let dir = config.model_dir();
        assert!(dir.ends_with(".capgen/models") || dir.to_string_lossy().contains("models"));
    }

    #[test]
    fn test_model_dir_explicit_cache() {
        let mut config = Config::default();
        config.models.cache_dir = Some(PathBuf::from("/tmp/models"));
        assert_eq!(config.model_dir(), PathBuf::from("/tmp/models"));
    }
}
