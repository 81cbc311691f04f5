//! Sub-configuration structs with built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pretrained model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Caption model identifier (encoder/decoder pair plus tokenizer)
    pub caption_model: String,

    /// Image-text embedding model identifier
    pub embedding_model: String,

    /// Model cache directory. `None` means the default location
    /// (`~/.capgen/models`).
    pub cache_dir: Option<PathBuf>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            caption_model: "vit-gpt2-image-captioning".to_string(),
            embedding_model: "clip-vit-base-patch32".to_string(),
            cache_dir: None,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory where the CSV manifest is written
    pub dir: PathBuf,

    /// Default output mode: "csv" or "rename"
    pub mode: String,

    /// Manifest file name
    pub csv_name: String,

    /// Maximum filename length in rename mode (extension included)
    pub max_filename_len: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("outputs"),
            mode: "csv".to_string(),
            csv_name: "desc.csv".to_string(),
            max_filename_len: 128,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
