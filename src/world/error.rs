//! Error types for data loading.

use thiserror::Error;

/// Errors that can occur when loading configuration or definition files.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// File or directory could not be found.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// File could not be read.
    #[error("Failed to read file '{path}': {details}")]
    ReadError { path: String, details: String },

    /// RON parsing failed.
    #[error("Parse error in '{path}': {details}")]
    ParseError { path: String, details: String },

    /// The file parsed but describes something the simulation cannot use.
    #[error("Invalid definition '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },
}
