//! capgen-core — batch image-to-prompt captioning library.
//!
//! capgen takes a folder of images and generates a text prompt for each one
//! using two pretrained models: a caption generator (ViT encoder + GPT-2
//! decoder) and a CLIP image-text embedding model, both running locally via
//! ONNX Runtime. Results are written as a `desc.csv` manifest or by
//! renaming each image to its sanitized prompt.
//!
//! # Architecture
//!
//! ```text
//! Directory → Discover → Decode → Describe (caption [+ CLIP]) → CSV / Rename
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use capgen_core::{BatchRunner, BatchSource, Config, ModelProvider, PromptMode};
//!
//! let config = Config::load();
//! let provider = ModelProvider::load(&config)?;
//! let runner = BatchRunner::new(&provider);
//!
//! let source = BatchSource::Directory("./my_images".into());
//! let results = runner.run(&source, PromptMode::Best)?;
//! capgen_core::output::write_manifest(&results, &"./my_images/desc.csv".into())?;
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod provider;

// Re-exports for convenient access
pub use config::Config;
pub use error::{CapgenError, ConfigError, PipelineError, PipelineResult, Result};
pub use output::{rename_all, sanitize_for_filename, write_manifest, OutputMode, RenameReport};
pub use pipeline::{BatchEntry, BatchResults, BatchRunner, BatchSource, FileDiscovery};
pub use provider::{Describer, ModelPaths, ModelProvider, PromptMode};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
