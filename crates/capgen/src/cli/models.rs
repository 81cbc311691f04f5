//! The `capgen models` command for managing pretrained models.

use capgen_core::provider::{
    DECODER_MODEL_FILENAME, ENCODER_MODEL_FILENAME, TOKENIZER_FILENAME, VISUAL_MODEL_FILENAME,
};
use capgen_core::{Config, ModelProvider};
use clap::{Args, Subcommand};
use std::path::Path;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download required models (caption encoder/decoder + tokenizer + CLIP)
    Download,

    /// List installed models
    List,

    /// Show model directory path
    Path,
}

/// One downloadable model file.
struct ModelFile {
    /// Hugging Face repository
    repo: &'static str,
    /// Path within the repository
    remote_path: &'static str,
    /// Filename inside the local model directory
    local_name: &'static str,
}

/// Files making up the caption model (ViT encoder + GPT-2 decoder).
const CAPTION_FILES: &[ModelFile] = &[
    ModelFile {
        repo: "Xenova/vit-gpt2-image-captioning",
        remote_path: "onnx/encoder_model.onnx",
        local_name: ENCODER_MODEL_FILENAME,
    },
    ModelFile {
        repo: "Xenova/vit-gpt2-image-captioning",
        remote_path: "onnx/decoder_model.onnx",
        local_name: DECODER_MODEL_FILENAME,
    },
    ModelFile {
        repo: "Xenova/vit-gpt2-image-captioning",
        remote_path: "tokenizer.json",
        local_name: TOKENIZER_FILENAME,
    },
];

/// The CLIP visual encoder used for `best` mode feature extraction.
const EMBEDDING_FILES: &[ModelFile] = &[ModelFile {
    repo: "Xenova/clip-vit-base-patch32",
    remote_path: "onnx/vision_model.onnx",
    local_name: VISUAL_MODEL_FILENAME,
}];

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: Config) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::Download => {
            println!("Downloading capgen models:\n");
            println!("  Caption model (ViT-GPT2)   ~940MB");
            println!("  CLIP vision encoder        ~340MB\n");

            let client = reqwest::Client::new();

            let caption_dir = config.model_dir().join(&config.models.caption_model);
            download_set(CAPTION_FILES, &caption_dir, &client).await?;

            let embedding_dir = config.model_dir().join(&config.models.embedding_model);
            download_set(EMBEDDING_FILES, &embedding_dir, &client).await?;

            tracing::info!("All downloads complete.");
        }

        ModelsCommand::List => {
            let model_dir = config.model_dir();

            if !model_dir.exists() {
                println!("No models installed.");
                println!("Run `capgen models download` to download required models.");
                return Ok(());
            }

            println!("Installed models:");
            println!("  Directory: {}\n", model_dir.display());

            println!("  Caption model ({}):", config.models.caption_model);
            let caption_dir = model_dir.join(&config.models.caption_model);
            for file in CAPTION_FILES {
                print_status(&caption_dir, file.local_name);
            }

            println!("\n  Embedding model ({}):", config.models.embedding_model);
            let embedding_dir = model_dir.join(&config.models.embedding_model);
            for file in EMBEDDING_FILES {
                print_status(&embedding_dir, file.local_name);
            }

            if ModelProvider::models_exist(&config) {
                println!("\nAll models ready.");
            } else {
                println!("\nMissing files. Run `capgen models download` to fetch them.");
            }
        }

        ModelsCommand::Path => {
            let model_dir = config.model_dir();
            println!("{}", model_dir.display());
        }
    }

    Ok(())
}

fn print_status(dir: &Path, local_name: &str) {
    let status = if dir.join(local_name).exists() {
        "ready"
    } else {
        "not installed"
    };
    println!("    - {:30} {}", local_name, status);
}

/// Download a set of model files into `dir`, skipping any already present.
async fn download_set(
    files: &[ModelFile],
    dir: &Path,
    client: &reqwest::Client,
) -> anyhow::Result<()> {
    for file in files {
        let dest = dir.join(file.local_name);
        if dest.exists() {
            tracing::info!("{} already exists at {:?}", file.local_name, dest);
            continue;
        }

        std::fs::create_dir_all(dir)?;

        let url = format!(
            "https://huggingface.co/{}/resolve/main/{}",
            file.repo, file.remote_path
        );

        tracing::info!("Downloading {}...", file.local_name);
        tracing::info!("  Source: {}", url);
        tracing::info!("  Destination: {:?}", dest);

        download_file(client, &url, &dest).await?;

        let file_size = std::fs::metadata(&dest)?.len();
        tracing::info!(
            "  {} complete ({:.1} MB)",
            file.local_name,
            file_size as f64 / (1024.0 * 1024.0)
        );
    }

    Ok(())
}

/// Download a file from a URL to a local path, streaming to disk.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let total_size = response.content_length();
    if let Some(size) = total_size {
        tracing::info!("  Size: {:.1} MB", size as f64 / (1024.0 * 1024.0));
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if let Some(total) = total_size {
            if downloaded % (50 * 1024 * 1024) < chunk.len() as u64 {
                tracing::info!(
                    "  Progress: {:.0}%",
                    downloaded as f64 / total as f64 * 100.0
                );
            }
        }
    }

    file.flush().await?;
    Ok(())
}
