//! The `capgen process` command: batch captioning with progress and output.

use std::path::{Path, PathBuf};

use capgen_core::{
    output, BatchRunner, BatchSource, Config, ModelProvider, OutputMode, PromptMode,
};
use clap::{Args, ValueEnum};

/// Arguments for the `process` command.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Image file or directory to caption
    #[arg(required = true)]
    pub input: PathBuf,

    /// Prompt generation mode
    #[arg(short, long, value_enum, default_value = "best")]
    pub mode: ModeArg,

    /// What to do with the generated prompts (overrides config)
    #[arg(long, value_enum)]
    pub output_mode: Option<OutputModeArg>,

    /// CSV manifest destination (defaults to desc.csv inside the input
    /// directory; ignored in rename mode)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Maximum filename length in rename mode (overrides config)
    #[arg(long)]
    pub max_filename_len: Option<usize>,
}

/// Prompt mode as exposed on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    /// Caption model output only
    Caption,
    /// Caption plus descriptive feature text (default)
    Best,
    /// Not implemented
    Fast,
    /// Not implemented
    Classic,
    /// Not implemented
    Negative,
}

impl From<ModeArg> for PromptMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Caption => PromptMode::Caption,
            ModeArg::Best => PromptMode::Best,
            ModeArg::Fast => PromptMode::Fast,
            ModeArg::Classic => PromptMode::Classic,
            ModeArg::Negative => PromptMode::Negative,
        }
    }
}

/// Output mode as exposed on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputModeArg {
    /// Write a desc.csv manifest
    Csv,
    /// Rename each image to its sanitized prompt
    Rename,
}

impl From<OutputModeArg> for OutputMode {
    fn from(arg: OutputModeArg) -> Self {
        match arg {
            OutputModeArg::Csv => OutputMode::Csv,
            OutputModeArg::Rename => OutputMode::Rename,
        }
    }
}

/// Execute the process command.
pub fn execute(args: ProcessArgs, mut config: Config) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.input
        );
    }
    if let Some(len) = args.max_filename_len {
        config.output.max_filename_len = len;
    }

    let mode = PromptMode::from(args.mode);
    let source = if args.input.is_dir() {
        BatchSource::Directory(args.input.clone())
    } else {
        BatchSource::Files(vec![args.input.clone()])
    };

    let provider = ModelProvider::load(&config)?;
    let runner = BatchRunner::new(&provider);

    let start_time = std::time::Instant::now();
    let progress = create_progress_bar();

    let results = runner.run_with_progress(&source, mode, |done, total| {
        if progress.length() != Some(total as u64) {
            progress.set_length(total as u64);
        }
        progress.set_position(done as u64);
        let elapsed = start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            progress.set_message(format!("{:.1} img/sec", done as f64 / elapsed));
        }
    })?;
    progress.finish_and_clear();

    if results.is_empty() {
        tracing::warn!("No supported image files found at {:?}", args.input);
        println!("No images to process.");
        return Ok(());
    }

    let output_mode = match args.output_mode {
        Some(arg) => OutputMode::from(arg),
        None => config.output.mode.parse()?,
    };

    let mut renamed = 0;
    let mut rename_skipped = 0;
    match output_mode {
        OutputMode::Csv => {
            let csv_path = resolve_csv_path(args.out.as_deref(), &args.input, &config);
            let rows = output::write_manifest(&results, &csv_path)?;
            println!("Generated {rows} prompt(s), saved to {}", csv_path.display());
        }
        OutputMode::Rename => {
            let report = output::rename_all(&results, config.output.max_filename_len);
            renamed = report.renamed;
            rename_skipped = report.skipped;
            println!("Generated {} prompt(s), renamed {renamed} file(s)", results.len());
        }
    }

    print_summary(
        results.succeeded() as u64,
        results.failed() as u64,
        renamed as u64,
        rename_skipped as u64,
        start_time.elapsed(),
    );

    Ok(())
}

/// Where the CSV manifest goes: `--out` wins; otherwise the manifest lands
/// next to the images when the input is a directory, else in the configured
/// output directory.
fn resolve_csv_path(out: Option<&Path>, input: &Path, config: &Config) -> PathBuf {
    match out {
        Some(path) => path.to_path_buf(),
        None => {
            let dir = if input.is_dir() {
                input.to_path_buf()
            } else {
                config.output_dir()
            };
            dir.join(&config.output.csv_name)
        }
    }
}

/// Create a progress bar for the batch loop.
fn create_progress_bar() -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary block after batch processing.
fn print_summary(succeeded: u64, failed: u64, renamed: u64, rename_skipped: u64, elapsed: std::time::Duration) {
    let total = succeeded + failed;
    let rate = if elapsed.as_secs_f64() > 0.0 {
        succeeded as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Prompts:      {:>8}", succeeded);
    if failed > 0 {
        eprintln!("    Failed:       {:>8}", failed);
    }
    if renamed > 0 {
        eprintln!("    Renamed:      {:>8}", renamed);
    }
    if rename_skipped > 0 {
        eprintln!("    Skipped:      {:>8}", rename_skipped);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", total);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
}
