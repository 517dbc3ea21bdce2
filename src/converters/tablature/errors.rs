//! Error types for tablature import
//!
//! Only structural problems that make a walk impossible are errors. Every
//! other degradation is reported through `ConversionResult::skipped_elements`.

use thiserror::Error;

/// Top-level conversion error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The source document cannot be walked at all
    #[error("Invalid source document: {0}")]
    InvalidDocument(String),

    /// Settings could not be loaded
    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),
}

/// Settings loading errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("YAML error: {0}")]
    Yaml(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("{0}")]
    Invalid(String),
}
