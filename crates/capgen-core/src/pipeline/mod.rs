//! Batch captioning pipeline.
//!
//! - **discovery**: find image files in a directory
//! - **decode**: load and decode images with format detection
//! - **runner**: sequential batch orchestration with per-image isolation

pub mod decode;
pub mod discovery;
pub mod runner;

// Re-exports for convenient access
pub use decode::decode_image;
pub use discovery::{FileDiscovery, SUPPORTED_EXTENSIONS};
pub use runner::{BatchEntry, BatchResults, BatchRunner, BatchSource};
