//! Batch orchestration: drive captioning across many images and isolate
//! per-image failures.

use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::provider::{Describer, PromptMode};

use super::decode::decode_image;
use super::discovery::FileDiscovery;

/// Where the batch runner takes its images from.
#[derive(Debug, Clone)]
pub enum BatchSource {
    /// A directory, filtered to supported image extensions (non-recursive)
    Directory(PathBuf),
    /// An explicit list of image files, processed in the given order
    Files(Vec<PathBuf>),
}

impl BatchSource {
    fn resolve(&self) -> Vec<PathBuf> {
        match self {
            BatchSource::Directory(dir) => FileDiscovery::discover(dir),
            BatchSource::Files(files) => files.clone(),
        }
    }
}

/// One image's result within a batch.
#[derive(Debug)]
pub struct BatchEntry {
    /// Full path to the source image
    pub path: PathBuf,
    /// Just the filename portion
    pub file_name: String,
    /// The generated prompt, or the typed error that stopped this image
    pub outcome: Result<String, PipelineError>,
}

impl BatchEntry {
    /// Render the outcome as prompt text for the output writers.
    ///
    /// Failed entries yield the literal `ERROR: ...` marker that the CSV
    /// manifest has always carried.
    pub fn prompt_text(&self) -> String {
        match &self.outcome {
            Ok(prompt) => prompt.clone(),
            Err(e) => format!("ERROR: {e}"),
        }
    }
}

/// Insertion-ordered collection of per-image results for one run.
#[derive(Debug, Default)]
pub struct BatchResults {
    entries: Vec<BatchEntry>,
}

impl BatchResults {
    /// Entries in processing order.
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that produced a prompt.
    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_ok()).count()
    }

    /// Number of entries that failed.
    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_err()).count()
    }

    /// Append an entry, preserving insertion order.
    pub fn push(&mut self, entry: BatchEntry) {
        self.entries.push(entry);
    }
}

impl<'a> IntoIterator for &'a BatchResults {
    type Item = &'a BatchEntry;
    type IntoIter = std::slice::Iter<'a, BatchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Drives captioning across a batch of images, strictly sequentially.
///
/// The provider is borrowed, not owned: construct it once at startup and
/// hand it to as many runs as needed.
pub struct BatchRunner<'a, D: Describer> {
    provider: &'a D,
}

impl<'a, D: Describer> BatchRunner<'a, D> {
    pub fn new(provider: &'a D) -> Self {
        Self { provider }
    }

    /// Run the batch without progress reporting.
    pub fn run(&self, source: &BatchSource, mode: PromptMode) -> Result<BatchResults, PipelineError> {
        self.run_with_progress(source, mode, |_, _| {})
    }

    /// Run the batch, invoking `progress(done, total)` after every image.
    ///
    /// An unsupported mode is rejected before any image is touched. Every
    /// other failure is per-image: decode and provider errors are recorded
    /// in that image's entry and the batch continues, so the returned
    /// collection always has one entry per discovered image.
    pub fn run_with_progress(
        &self,
        source: &BatchSource,
        mode: PromptMode,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<BatchResults, PipelineError> {
        if !mode.is_supported() {
            return Err(PipelineError::UnsupportedMode {
                mode: mode.to_string(),
            });
        }

        let files = source.resolve();
        let total = files.len();
        tracing::info!("Generating prompts for {total} image(s), mode {mode}");

        let mut results = BatchResults::default();
        for (idx, path) in files.into_iter().enumerate() {
            let outcome = self.caption_one(&path, mode);
            if let Err(e) = &outcome {
                tracing::warn!("Failed: {:?} - {e}", path);
            }
            results.push(BatchEntry {
                file_name: file_name_of(&path),
                path,
                outcome,
            });
            progress(idx + 1, total);
        }

        Ok(results)
    }

    fn caption_one(&self, path: &Path, mode: PromptMode) -> Result<String, PipelineError> {
        let image = decode_image(path)?;
        self.provider.describe(&image, path, mode)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}
