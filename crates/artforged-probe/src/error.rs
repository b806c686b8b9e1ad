//! Error types for artforged-probe

use std::path::PathBuf;

/// Errors that can occur while inspecting media bytes
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The buffer ends before a required field
    #[error("Truncated data: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    /// The leading bytes do not match the expected format
    #[error("Invalid {0} signature")]
    InvalidSignature(&'static str),

    /// Format variant the parser deliberately does not handle
    #[error("Unsupported format: {0}")]
    Unsupported(String),

    /// Structurally invalid data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The header declares a zero width or height
    #[error("Header declares zero width or height")]
    ZeroDimensions,
}

impl ProbeError {
    /// Create an unsupported-format error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create an invalid-data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }
}

/// Result type for artforged-probe operations.
pub type Result<T> = std::result::Result<T, ProbeError>;
