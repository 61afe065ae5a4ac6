//! Error types for afetch

use thiserror::Error;

/// Result type alias for afetch operations
pub type Result<T> = std::result::Result<T, AfError>;

/// Main error type for afetch
#[derive(Error, Debug)]
pub enum AfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid structure format '{0}': expected 'pdb', 'cif' or 'pdb<N>'")]
    InvalidFormat(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
