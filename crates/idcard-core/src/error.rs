//! Error types for the idcard-core library.
//!
//! The parser itself is total and never produces these; they cover the
//! glue around it (reading OCR output, loading configuration).

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the idcard library.
#[derive(Error, Debug)]
pub enum IdCardError {
    /// OCR output could not be obtained.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to obtaining OCR output for an image.
#[derive(Error, Debug)]
pub enum OcrError {
    /// No OCR output exists for the image.
    #[error("no OCR output found for {}", .0.display())]
    MissingOutput(PathBuf),

    /// The OCR output exists but could not be understood.
    #[error("invalid OCR output in {}: {reason}", .path.display())]
    InvalidOutput { path: PathBuf, reason: String },

    /// The input is not something the engine can read.
    #[error("unsupported input: {}", .0.display())]
    Unsupported(PathBuf),
}

/// Errors related to configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be parsed.
    #[error("failed to parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    /// A configuration value is out of range.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Result type for the idcard library.
pub type Result<T> = std::result::Result<T, IdCardError>;
