//! Logging setup for the CLI.
//!
//! Logs go to stderr; stdout is reserved for prompts and paths. The
//! configured `logging.level` seeds the filter, `--verbose` forces debug,
//! and `RUST_LOG` overrides both when set.

use capgen_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Pick the default filter directive from config and the verbosity flag.
fn level_directive(config: &Config, verbose: bool) -> &str {
    if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    }
}

/// Initialize the tracing subscriber.
///
/// Output is JSON when `--json-logs` is passed or `logging.format` is
/// `"json"`, pretty-printed otherwise.
pub fn init(config: &Config, verbose: bool, json_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(config, verbose)));

    if json_logs || config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}
