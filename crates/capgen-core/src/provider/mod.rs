//! Model provider: turns one decoded image into one text prompt.
//!
//! The provider owns two pretrained models loaded via ONNX Runtime: a
//! caption generator (ViT encoder + GPT-2 decoder) and a CLIP image-text
//! embedding model. It is constructed explicitly by the caller and passed
//! by reference into the batch runner — there is no process-global
//! singleton, and multiple isolated instances are fine (e.g. in tests).
//!
//! # Usage
//!
//! ```rust,ignore
//! use capgen_core::{Config, ModelProvider, PromptMode};
//!
//! let config = Config::load();
//! let provider = ModelProvider::load(&config)?;
//! let prompt = provider.describe(&image, &path, PromptMode::Best)?;
//! ```

pub(crate) mod captioner;
pub(crate) mod embedder;
pub(crate) mod preprocess;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::DynamicImage;

use crate::config::Config;
use crate::error::PipelineError;

pub use captioner::Captioner;
pub use embedder::ClipEmbedder;

/// Caption encoder ONNX filename inside the caption model directory.
pub const ENCODER_MODEL_FILENAME: &str = "encoder_model.onnx";

/// Caption decoder ONNX filename inside the caption model directory.
pub const DECODER_MODEL_FILENAME: &str = "decoder_model.onnx";

/// Tokenizer config filename inside the caption model directory.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// CLIP visual encoder ONNX filename inside the embedding model directory.
pub const VISUAL_MODEL_FILENAME: &str = "visual.onnx";

/// Fixed descriptive suffix appended in `Best` mode.
///
/// The embedding-to-text step is a constant: the suffix never varies with
/// the image, and prompt files written in `best` mode carry this exact
/// literal. The embedding is still computed so load and inference failures
/// surface per image.
pub const FEATURE_TEXT: &str = "high quality, detailed, sharp focus, professional";

/// How a prompt is generated for an image.
///
/// Only `Caption` and `Best` are implemented; the remaining variants exist
/// for CLI compatibility and are rejected with an unsupported-mode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// Caption model output only
    Caption,
    /// Caption plus embedding-derived feature text
    Best,
    /// Not implemented
    Fast,
    /// Not implemented
    Classic,
    /// Not implemented
    Negative,
}

impl PromptMode {
    /// Whether this mode has an implementation behind it.
    pub fn is_supported(&self) -> bool {
        matches!(self, PromptMode::Caption | PromptMode::Best)
    }
}

impl std::fmt::Display for PromptMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PromptMode::Caption => "caption",
            PromptMode::Best => "best",
            PromptMode::Fast => "fast",
            PromptMode::Classic => "classic",
            PromptMode::Negative => "negative",
        };
        write!(f, "{name}")
    }
}

impl FromStr for PromptMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "caption" => Ok(PromptMode::Caption),
            "best" => Ok(PromptMode::Best),
            "fast" => Ok(PromptMode::Fast),
            "classic" => Ok(PromptMode::Classic),
            "negative" => Ok(PromptMode::Negative),
            other => Err(PipelineError::UnsupportedMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// The seam between the batch runner and the models.
///
/// Implemented by [`ModelProvider`] for real inference and by stubs in
/// tests, so batch behavior is testable without model files on disk.
pub trait Describer {
    /// Produce a text description for one decoded image.
    fn describe(
        &self,
        image: &DynamicImage,
        path: &Path,
        mode: PromptMode,
    ) -> Result<String, PipelineError>;
}

/// Holds the caption and embedding models and produces prompts.
pub struct ModelProvider {
    captioner: Captioner,
    embedder: ClipEmbedder,
}

impl ModelProvider {
    /// Load both models from the configured cache directory.
    ///
    /// Model files are expected at:
    /// - `{cache}/{caption_model}/encoder_model.onnx`
    /// - `{cache}/{caption_model}/decoder_model.onnx`
    /// - `{cache}/{caption_model}/tokenizer.json`
    /// - `{cache}/{embedding_model}/visual.onnx`
    pub fn load(config: &Config) -> Result<Self, PipelineError> {
        let paths = ModelPaths::resolve(config);

        for path in [
            &paths.encoder,
            &paths.decoder,
            &paths.tokenizer,
            &paths.visual,
        ] {
            if !path.exists() {
                return Err(PipelineError::Model {
                    message: format!(
                        "Model file not found: {path:?}. Run `capgen models download` first."
                    ),
                });
            }
        }

        tracing::info!("Loading caption model {:?}", config.models.caption_model);
        let captioner = Captioner::load(&paths.encoder, &paths.decoder, &paths.tokenizer)?;
        tracing::info!("Loading embedding model {:?}", config.models.embedding_model);
        let embedder = ClipEmbedder::load(&paths.visual)?;
        tracing::info!("Models loaded");

        Ok(Self {
            captioner,
            embedder,
        })
    }

    /// Check whether all model files exist on disk.
    pub fn models_exist(config: &Config) -> bool {
        let paths = ModelPaths::resolve(config);
        paths.encoder.exists()
            && paths.decoder.exists()
            && paths.tokenizer.exists()
            && paths.visual.exists()
    }
}

impl Describer for ModelProvider {
    fn describe(
        &self,
        image: &DynamicImage,
        path: &Path,
        mode: PromptMode,
    ) -> Result<String, PipelineError> {
        match mode {
            PromptMode::Caption => self.captioner.generate(image, path),
            PromptMode::Best => {
                let caption = self.captioner.generate(image, path)?;
                let embedding = self.embedder.embed(image, path)?;
                Ok(compose_best(&caption, feature_text(&embedding)))
            }
            unsupported => Err(PipelineError::UnsupportedMode {
                mode: unsupported.to_string(),
            }),
        }
    }
}

/// Resolved on-disk locations of all model files.
pub struct ModelPaths {
    pub encoder: PathBuf,
    pub decoder: PathBuf,
    pub tokenizer: PathBuf,
    pub visual: PathBuf,
}

impl ModelPaths {
    /// Resolve model file paths from the config's cache dir and model ids.
    pub fn resolve(config: &Config) -> Self {
        let model_dir = config.model_dir();
        let caption_dir = model_dir.join(&config.models.caption_model);
        let embedding_dir = model_dir.join(&config.models.embedding_model);
        Self {
            encoder: caption_dir.join(ENCODER_MODEL_FILENAME),
            decoder: caption_dir.join(DECODER_MODEL_FILENAME),
            tokenizer: caption_dir.join(TOKENIZER_FILENAME),
            visual: embedding_dir.join(VISUAL_MODEL_FILENAME),
        }
    }
}

/// Map an image embedding to descriptive prompt text.
///
/// Currently a constant — see [`FEATURE_TEXT`].
pub fn feature_text(_embedding: &[f32]) -> &'static str {
    FEATURE_TEXT
}

/// Join a caption with feature text the way `best` mode prompts are built.
pub fn compose_best(caption: &str, features: &str) -> String {
    format!("{caption}, {features}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!(PromptMode::from_str("best").unwrap(), PromptMode::Best);
        assert_eq!(
            PromptMode::from_str("CAPTION").unwrap(),
            PromptMode::Caption
        );
        assert_eq!(PromptMode::from_str("fast").unwrap(), PromptMode::Fast);
        assert!(PromptMode::from_str("surreal").is_err());
    }

    #[test]
    fn test_mode_support() {
        assert!(PromptMode::Caption.is_supported());
        assert!(PromptMode::Best.is_supported());
        assert!(!PromptMode::Fast.is_supported());
        assert!(!PromptMode::Classic.is_supported());
        assert!(!PromptMode::Negative.is_supported());
    }

    #[test]
    fn test_mode_display_round_trip() {
        for mode in [
            PromptMode::Caption,
            PromptMode::Best,
            PromptMode::Fast,
            PromptMode::Classic,
            PromptMode::Negative,
        ] {
            assert_eq!(PromptMode::from_str(&mode.to_string()).unwrap(), mode);
        }
    }

    #[test]
    fn test_feature_text_is_the_fixed_suffix() {
        assert_eq!(
            feature_text(&[0.1, 0.2]),
            "high quality, detailed, sharp focus, professional"
        );
    }

    #[test]
    fn test_compose_best() {
        assert_eq!(
            compose_best("a cat on a mat", feature_text(&[])),
            "a cat on a mat, high quality, detailed, sharp focus, professional"
        );
    }

    #[test]
    fn test_models_exist_reflects_files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.models.cache_dir = Some(dir.path().to_path_buf());
        assert!(!ModelProvider::models_exist(&config));

        let paths = ModelPaths::resolve(&config);
        for path in [&paths.encoder, &paths.decoder, &paths.tokenizer, &paths.visual] {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"x").unwrap();
        }
        assert!(ModelProvider::models_exist(&config));
    }

    #[test]
    fn test_model_paths_resolve() {
        let config = Config::default();
        let paths = ModelPaths::resolve(&config);
        assert!(paths
            .encoder
            .ends_with("vit-gpt2-image-captioning/encoder_model.onnx"));
        assert!(paths
            .visual
            .ends_with("clip-vit-base-patch32/visual.onnx"));
    }
}
