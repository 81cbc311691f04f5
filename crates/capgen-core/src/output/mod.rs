//! Output writers for batch results.
//!
//! Two modes: a two-column CSV manifest (`image,prompt`), or renaming each
//! source file to a sanitized version of its prompt.

pub mod manifest;
pub mod rename;

pub use manifest::{write_manifest, write_manifest_to};
pub use rename::{rename_all, RenameReport};

use std::str::FromStr;

use crate::error::ConfigError;

/// How batch results are externalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Write a `desc.csv` manifest next to the images
    Csv,
    /// Rename each image to its sanitized prompt
    Rename,
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" | "desc.csv" => Ok(OutputMode::Csv),
            "rename" => Ok(OutputMode::Rename),
            other => Err(ConfigError::ValidationError(format!(
                "unknown output mode {other:?}, expected \"csv\" or \"rename\""
            ))),
        }
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputMode::Csv => write!(f, "csv"),
            OutputMode::Rename => write!(f, "rename"),
        }
    }
}

/// Punctuation allowed in sanitized filenames, besides alphanumerics.
const ALLOWED_PUNCT: &[char] = &[',', '.', '_', '-', '!', ' '];

/// Reduce a prompt to a filesystem-safe name.
///
/// Keeps only alphanumeric characters and `, . _ - ! space`, trims
/// surrounding whitespace, and truncates to `max_len - 4` characters to
/// leave room for an extension.
pub fn sanitize_for_filename(prompt: &str, max_len: usize) -> String {
    let keep = max_len.saturating_sub(4);
    prompt
        .chars()
        .filter(|c| c.is_alphanumeric() || ALLOWED_PUNCT.contains(c))
        .collect::<String>()
        .trim()
        .chars()
        .take(keep)
        .collect()
}
