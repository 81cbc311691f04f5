//! Error types for the capgen captioning pipeline.
//!
//! Errors are organized by stage so callers can tell a rejected mode apart
//! from a per-image failure that the batch runner absorbs into its results.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for capgen operations.
#[derive(Error, Debug)]
pub enum CapgenError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV manifest write errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Caption generation failed
    #[error("Caption error for {path}: {message}")]
    Caption { path: PathBuf, message: String },

    /// Embedding inference failed
    #[error("Embedding error for {path}: {message}")]
    Embedding { path: PathBuf, message: String },

    /// Model loading failed (missing files, bad ONNX graph, tokenizer)
    #[error("Model error: {message}")]
    Model { message: String },

    /// The requested prompt mode is not implemented
    #[error("Unsupported prompt mode: {mode}")]
    UnsupportedMode { mode: String },

    /// Renaming a file to its sanitized prompt failed
    #[error("Rename error for {path}: {message}")]
    Rename { path: PathBuf, message: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Convenience type alias for capgen results.
pub type Result<T> = std::result::Result<T, CapgenError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
