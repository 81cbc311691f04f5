//! Rename output: give each image a filename derived from its prompt.
//!
//! Renames happen in place, within each image's own directory. There is no
//! manifest of original-to-new names.

use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::pipeline::BatchResults;

use super::sanitize_for_filename;

/// Upper bound on the collision suffix search. Exhausting it fails that
/// single file, not the batch.
const MAX_COLLISION_ATTEMPTS: usize = 1000;

/// Counts of what the rename pass did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RenameReport {
    /// Files renamed to their sanitized prompt
    pub renamed: usize,
    /// Files left untouched (failed entries, empty names, rename errors)
    pub skipped: usize,
}

/// Rename every successful entry to its sanitized prompt.
///
/// Collisions are resolved by appending `_1`, `_2`, … before the extension;
/// the original extension is always preserved. Failed entries, prompts that
/// sanitize to nothing, and per-file rename errors are skipped with a
/// warning and counted; they never abort the pass.
pub fn rename_all(results: &BatchResults, max_len: usize) -> RenameReport {
    let mut report = RenameReport::default();

    for entry in results {
        let prompt = match &entry.outcome {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Skipping rename of {:?}: {e}", entry.path);
                report.skipped += 1;
                continue;
            }
        };

        let name = sanitize_for_filename(prompt, max_len);
        if name.is_empty() {
            tracing::warn!(
                "Skipping rename of {:?}: prompt sanitized to an empty name",
                entry.path
            );
            report.skipped += 1;
            continue;
        }

        match rename_one(&entry.path, &name) {
            Ok(target) => {
                tracing::debug!("Renamed {:?} -> {:?}", entry.path, target);
                report.renamed += 1;
            }
            Err(e) => {
                tracing::warn!("{e}");
                report.skipped += 1;
            }
        }
    }

    report
}

/// Rename a single file to `name`, resolving collisions by suffixing.
fn rename_one(source: &Path, name: &str) -> Result<PathBuf, PipelineError> {
    let dir = source.parent().unwrap_or_else(|| Path::new("."));
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    let target = dir.join(format!("{name}{ext}"));
    if target == source {
        // Already carries the prompt name.
        return Ok(target);
    }

    let target = if target.exists() {
        free_suffixed_target(dir, name, &ext).ok_or_else(|| PipelineError::Rename {
            path: source.to_path_buf(),
            message: format!("No free name after {MAX_COLLISION_ATTEMPTS} suffix attempts"),
        })?
    } else {
        target
    };

    std::fs::rename(source, &target).map_err(|e| PipelineError::Rename {
        path: source.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(target)
}

/// Find the first free `{name}_{i}{ext}` in `dir`.
fn free_suffixed_target(dir: &Path, name: &str, ext: &str) -> Option<PathBuf> {
    (1..=MAX_COLLISION_ATTEMPTS)
        .map(|i| dir.join(format!("{name}_{i}{ext}")))
        .find(|candidate| !candidate.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::BatchEntry;

    fn entry(path: &Path, outcome: Result<&str, &str>) -> BatchEntry {
        BatchEntry {
            path: path.to_path_buf(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            outcome: outcome.map(String::from).map_err(|m| {
                PipelineError::Caption {
                    path: path.to_path_buf(),
                    message: m.to_string(),
                }
            }),
        }
    }

    fn touch(path: &Path) {
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_rename_to_sanitized_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("img001.jpg");
        touch(&src);

        let mut results = BatchResults::default();
        results.push(entry(&src, Ok("a red fox in snow")));

        let report = rename_all(&results, 128);
        assert_eq!(report, RenameReport { renamed: 1, skipped: 0 });
        assert!(dir.path().join("a red fox in snow.jpg").exists());
        assert!(!src.exists());
    }

    #[test]
    fn test_collision_suffixes_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let sources: Vec<_> = (0..3)
            .map(|i| {
                let p = dir.path().join(format!("src{i}.jpg"));
                touch(&p);
                p
            })
            .collect();

        let mut results = BatchResults::default();
        for src in &sources {
            results.push(entry(src, Ok("same prompt")));
        }

        let report = rename_all(&results, 128);
        assert_eq!(report.renamed, 3);
        // First keeps the unsuffixed base; later ones get _1, _2.
        assert!(dir.path().join("same prompt.jpg").exists());
        assert!(dir.path().join("same prompt_1.jpg").exists());
        assert!(dir.path().join("same prompt_2.jpg").exists());
    }

    #[test]
    fn test_extension_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("photo.WEBP");
        touch(&src);

        let mut results = BatchResults::default();
        results.push(entry(&src, Ok("sunset")));

        rename_all(&results, 128);
        assert!(dir.path().join("sunset.WEBP").exists());
    }

    #[test]
    fn test_error_entries_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("bad.jpg");
        touch(&src);

        let mut results = BatchResults::default();
        results.push(entry(&src, Err("decode failed")));

        let report = rename_all(&results, 128);
        assert_eq!(report, RenameReport { renamed: 0, skipped: 1 });
        assert!(src.exists());
    }

    #[test]
    fn test_empty_sanitized_name_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("odd.png");
        touch(&src);

        let mut results = BatchResults::default();
        results.push(entry(&src, Ok("#$%^&*")));

        let report = rename_all(&results, 128);
        assert_eq!(report, RenameReport { renamed: 0, skipped: 1 });
        assert!(src.exists());
    }

    #[test]
    fn test_missing_source_is_per_file_failure() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone.jpg");
        let live = dir.path().join("live.jpg");
        touch(&live);

        let mut results = BatchResults::default();
        results.push(entry(&gone, Ok("ghost")));
        results.push(entry(&live, Ok("still here")));

        let report = rename_all(&results, 128);
        assert_eq!(report, RenameReport { renamed: 1, skipped: 1 });
        assert!(dir.path().join("still here.jpg").exists());
    }

    #[test]
    fn test_already_named_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("sunset.jpg");
        touch(&src);

        let mut results = BatchResults::default();
        results.push(entry(&src, Ok("sunset")));

        let report = rename_all(&results, 128);
        assert_eq!(report.renamed, 1);
        assert!(src.exists());
        assert!(!dir.path().join("sunset_1.jpg").exists());
    }

    #[test]
    fn test_long_prompt_truncated_name() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("img.png");
        touch(&src);

        let mut results = BatchResults::default();
        results.push(entry(&src, Ok("w".repeat(500).as_str())));

        rename_all(&results, 32);
        let expected = format!("{}.png", "w".repeat(28));
        assert!(dir.path().join(expected).exists());
    }
}
