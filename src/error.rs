use std::path::PathBuf;

use thiserror::Error;

/// Error type returned by change listeners
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during recipe store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store path could not be normalized to an absolute file path
    #[error("Invalid store path '{}': {reason}", .path.display())]
    PathError { path: PathBuf, reason: String },

    /// Failed to read or write the recipe file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// File content violates the section grammar
    #[error("Format error on line {line}: {message}")]
    FormatError { line: usize, message: String },

    /// Index outside the current collection
    #[error("Index {index} is out of range (store holds {len} recipes)")]
    OutOfRange { index: usize, len: usize },

    /// No stored recipe matched the one given for deletion
    #[error("Recipe not found: {0}")]
    NotFound(String),

    /// A recipe holds a value that the file format cannot represent
    #[error("Recipe '{recipe}' cannot be saved: {reason}")]
    EncodeError { recipe: String, reason: String },

    /// A change listener failed
    #[error("Change listener failed: {0}")]
    NotifyError(ListenerError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl StoreError {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        StoreError::FormatError {
            line,
            message: message.into(),
        }
    }
}
