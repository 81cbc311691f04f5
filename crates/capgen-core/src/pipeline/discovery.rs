//! File discovery for finding images in a directory.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions the batch runner accepts, matched case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Discovers image files in a directory.
pub struct FileDiscovery;

impl FileDiscovery {
    /// Discover all supported image files at a path.
    ///
    /// If path is a file, returns it if supported. If path is a directory,
    /// lists its immediate entries (non-recursive, matching the scan the
    /// tool has always done). A missing path yields an empty list.
    pub fn discover(path: &Path) -> Vec<PathBuf> {
        if path.is_file() {
            if Self::is_supported(path) {
                return vec![path.to_path_buf()];
            }
            return vec![];
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let entry_path = entry.path();
            if entry_path.is_file() && Self::is_supported(entry_path) {
                files.push(entry_path.to_path_buf());
            }
        }

        // Sort by name for deterministic ordering
        files.sort();
        files
    }

    /// Check if a file has a supported extension.
    pub fn is_supported(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                SUPPORTED_EXTENSIONS.iter().any(|fmt| *fmt == ext_lower)
            })
            .unwrap_or(false)
    }
}
