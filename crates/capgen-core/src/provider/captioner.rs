//! Caption model session management and greedy text generation.
//!
//! The caption model is a ViT encoder / GPT-2 style decoder pair exported to
//! ONNX. The encoder maps a preprocessed image to hidden states; the decoder
//! is run autoregressively (full sequence each step, no KV cache) with
//! greedy argmax sampling until EOS or the token budget is reached.

use std::path::Path;
use std::sync::Mutex;

use image::DynamicImage;
use ort::session::Session;
use ort::value::Value;

use crate::error::PipelineError;

use super::preprocess::{preprocess, VIT_MEAN, VIT_STD};

/// ViT encoder input resolution.
const VIT_IMAGE_SIZE: u32 = 224;

/// GPT-2 start/end token. `decoder_start_token_id` equals `eos_token_id`
/// for the vit-gpt2 export.
const BOS_TOKEN: i64 = 50256;
const EOS_TOKEN: i64 = 50256;

/// Generation budget per caption.
const MAX_TOKENS: usize = 40;

/// Wraps the encoder and decoder ONNX sessions plus the tokenizer.
pub struct Captioner {
    encoder: Mutex<Session>,
    decoder: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
    /// Name of the encoder input tensor (detected from model metadata).
    encoder_input_name: String,
}

impl Captioner {
    /// Load the caption model from its encoder/decoder ONNX files and
    /// tokenizer config.
    pub fn load(
        encoder_path: &Path,
        decoder_path: &Path,
        tokenizer_path: &Path,
    ) -> Result<Self, PipelineError> {
        let encoder = Self::load_session(encoder_path)?;
        let decoder = Self::load_session(decoder_path)?;

        let tokenizer = tokenizers::Tokenizer::from_file(tokenizer_path).map_err(|e| {
            PipelineError::Model {
                message: format!("Failed to load tokenizer from {tokenizer_path:?}: {e}"),
            }
        })?;

        let encoder_input_name = encoder
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "pixel_values".to_string());

        tracing::debug!(
            "Loaded caption model (encoder input: {:?}, decoder inputs: {:?})",
            encoder_input_name,
            decoder
                .inputs()
                .iter()
                .map(|i| i.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            encoder: Mutex::new(encoder),
            decoder: Mutex::new(decoder),
            tokenizer,
            encoder_input_name,
        })
    }

    fn load_session(path: &Path) -> Result<Session, PipelineError> {
        Session::builder()
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(path)
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to load caption model from {path:?}: {e}"),
            })
    }

    /// Generate a natural-language caption for an image.
    pub fn generate(&self, image: &DynamicImage, path: &Path) -> Result<String, PipelineError> {
        let (hidden_shape, hidden_data) = self.encode_image(image, path)?;
        let token_ids = self.decode_greedy(&hidden_shape, &hidden_data, path)?;

        let ids: Vec<u32> = token_ids.iter().map(|&t| t as u32).collect();
        let caption = self
            .tokenizer
            .decode(&ids, true)
            .map_err(|e| PipelineError::Caption {
                path: path.to_path_buf(),
                message: format!("Token decode failed: {e}"),
            })?;

        Ok(caption.trim().to_string())
    }

    /// Run the ViT encoder, returning the hidden-state shape and flat data.
    fn encode_image(
        &self,
        image: &DynamicImage,
        path: &Path,
    ) -> Result<(Vec<i64>, Vec<f32>), PipelineError> {
        let tensor = preprocess(image, VIT_IMAGE_SIZE, VIT_MEAN, VIT_STD);
        let shape: Vec<i64> = tensor.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = tensor.iter().copied().collect();

        let input_value =
            Value::from_array((shape, flat_data)).map_err(|e| PipelineError::Caption {
                path: path.to_path_buf(),
                message: format!("Failed to create encoder input tensor: {e}"),
            })?;

        let inputs = ort::inputs![self.encoder_input_name.as_str() => input_value];

        let mut session = self.encoder.lock().map_err(|e| PipelineError::Caption {
            path: path.to_path_buf(),
            message: format!("Encoder session lock poisoned: {e}"),
        })?;

        let outputs = session.run(inputs).map_err(|e| PipelineError::Caption {
            path: path.to_path_buf(),
            message: format!("Encoder inference failed: {e}"),
        })?;

        let hidden = outputs
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .or_else(|| outputs.iter().next())
            .ok_or_else(|| PipelineError::Caption {
                path: path.to_path_buf(),
                message: "Encoder produced no outputs".to_string(),
            })?;

        let (shape, data) =
            hidden
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| PipelineError::Caption {
                    path: path.to_path_buf(),
                    message: format!("Failed to extract encoder hidden states: {e}"),
                })?;

        Ok((shape.to_vec(), data.to_vec()))
    }

    /// Greedy autoregressive decode against the encoder hidden states.
    fn decode_greedy(
        &self,
        hidden_shape: &[i64],
        hidden_data: &[f32],
        path: &Path,
    ) -> Result<Vec<i64>, PipelineError> {
        let mut session = self.decoder.lock().map_err(|e| PipelineError::Caption {
            path: path.to_path_buf(),
            message: format!("Decoder session lock poisoned: {e}"),
        })?;

        let mut tokens: Vec<i64> = vec![BOS_TOKEN];

        for _ in 0..MAX_TOKENS {
            let ids_value = Value::from_array((
                vec![1i64, tokens.len() as i64],
                tokens.clone(),
            ))
            .map_err(|e| PipelineError::Caption {
                path: path.to_path_buf(),
                message: format!("Failed to create input_ids tensor: {e}"),
            })?;

            let hidden_value =
                Value::from_array((hidden_shape.to_vec(), hidden_data.to_vec())).map_err(|e| {
                    PipelineError::Caption {
                        path: path.to_path_buf(),
                        message: format!("Failed to create hidden-state tensor: {e}"),
                    }
                })?;

            let inputs = ort::inputs![
                "input_ids" => ids_value,
                "encoder_hidden_states" => hidden_value,
            ];

            let outputs = session.run(inputs).map_err(|e| PipelineError::Caption {
                path: path.to_path_buf(),
                message: format!("Decoder inference failed: {e}"),
            })?;

            let logits = outputs
                .iter()
                .find(|(name, _)| *name == "logits")
                .or_else(|| outputs.iter().next())
                .ok_or_else(|| PipelineError::Caption {
                    path: path.to_path_buf(),
                    message: "Decoder produced no outputs".to_string(),
                })?;

            let (shape, data) =
                logits
                    .1
                    .try_extract_tensor::<f32>()
                    .map_err(|e| PipelineError::Caption {
                        path: path.to_path_buf(),
                        message: format!("Failed to extract decoder logits: {e}"),
                    })?;

            // Logits are [1, seq, vocab]; sample the last position.
            if shape.len() != 3 {
                return Err(PipelineError::Caption {
                    path: path.to_path_buf(),
                    message: format!("Unexpected logits shape: {:?}", shape),
                });
            }
            let vocab = shape[2] as usize;
            let last = &data[data.len() - vocab..];
            let next = argmax(last) as i64;

            if next == EOS_TOKEN {
                break;
            }
            tokens.push(next);
        }

        // Drop the BOS token before detokenizing.
        Ok(tokens[1..].to_vec())
    }
}

/// Index of the maximum value in a non-empty slice.
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    let mut best_val = f32::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_picks_largest() {
        assert_eq!(argmax(&[0.1, 3.0, -2.0, 2.9]), 1);
    }

    #[test]
    fn test_argmax_first_element() {
        assert_eq!(argmax(&[5.0, 1.0]), 0);
    }

    #[test]
    fn test_argmax_handles_negatives() {
        assert_eq!(argmax(&[-3.0, -1.5, -2.0]), 1);
    }
}
