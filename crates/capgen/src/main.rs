//! capgen CLI - batch image captioning with pretrained models.
//!
//! capgen generates a text prompt for every image in a folder and either
//! saves the results to a `desc.csv` manifest or renames the files to
//! contain their prompts.
//!
//! # Usage
//!
//! ```bash
//! # Caption a folder, writing desc.csv into it
//! capgen process ./my_images
//!
//! # Rename files to their prompts instead
//! capgen process ./my_images --output-mode rename
//!
//! # Manage models
//! capgen models download
//!
//! # View configuration
//! capgen config show
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// capgen - batch image captioning with pretrained caption and CLIP models.
#[derive(Parser, Debug)]
#[command(name = "capgen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Explicit config file, overriding the usual lookup chain
    #[arg(short, long, global = true, env = "CAPGEN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate prompts for images and write a CSV manifest or rename files
    Process(cli::process::ProcessArgs),

    /// Manage pretrained models (download, list, etc.)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Config load never fails: unreadable files in the chain are logged
    // (via tracing once it's up) and skipped.
    let config = capgen_core::Config::load_with_override(cli.config.as_deref());
    logging::init(&config, cli.verbose, cli.json_logs);

    tracing::debug!("capgen v{}", capgen_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Process(args) => cli::process::execute(args, config),
        Commands::Models(args) => cli::models::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config),
    }
}
