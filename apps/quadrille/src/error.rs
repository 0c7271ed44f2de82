//! # CLI Error Types
//!
//! The binary's error enum: core mapping errors plus everything that can go
//! wrong between the file system and the parsers.

use quadrille_core::QuadrilleError;
use thiserror::Error;

/// Errors surfaced by the Quadrille CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// A mapping-layer error from quadrille-core.
    #[error(transparent)]
    Core(#[from] QuadrilleError),

    /// A file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A data file does not contain valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A schema file does not contain a valid schema description.
    #[error("schema file error: {0}")]
    Schema(#[from] toml::de::Error),

    /// A file failed pre-read validation (missing, not a file, too large).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
