//! KASS Encoder Library
//!
//! This library converts source art files into KASS asset files: it probes
//! inputs, builds texture mip chains and writes the packed containers.

pub mod converter;
pub mod image_converter;
pub mod mipmap;
pub mod probe;
pub mod progress_tracker;

pub use converter::{BatchReport, ConversionOutcome, Converter};
pub use probe::SourceKind;

use kass_core::CompressionMode;
use std::path::PathBuf;

/// Extension given to converted files
pub const OUTPUT_EXTENSION: &str = "kass";

/// Result type for kass-encoder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for kass-encoder operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("KASS core error: {0}")]
    Core(#[from] kass_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unable to open {}: {message}", .path.display())]
    SourceUnreadable { path: PathBuf, message: String },

    #[error("Mip level {width}x{height} exceeds the maximum page size")]
    ImageTooLarge { width: u32, height: u32 },
}

/// Converter configuration
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Compression applied to texture pages
    pub compression: CompressionMode,
    /// Directory receiving converted files (None = next to each source)
    pub output_dir: Option<PathBuf>,
    /// Number of files converted in parallel
    pub jobs: usize,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            compression: CompressionMode::Lz4,
            output_dir: None,
            jobs: num_cpus::get(),
        }
    }
}
