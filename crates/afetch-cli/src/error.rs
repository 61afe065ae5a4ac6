//! Error types for the afetch CLI
//!
//! User-facing errors with messages that say what went wrong and what to try.
//! Retrieval and write failures are not errors here: the fetcher logs them
//! and reports [`FetchStatus::Failed`](crate::fetch::FetchStatus::Failed).

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// Structure format is not one of pdb, cif, pdb<N>
    #[error("Invalid format '{0}'. Use 'pdb', 'cif' or 'pdb<N>' for a biological assembly.")]
    InvalidFormat(String),

    /// Keyword arguments that the fetch command does not know
    #[error("Unknown argument: {0}")]
    UnknownArgument(String),

    /// Keyword argument with a value of the wrong shape
    #[error("Invalid value for '{key}': '{value}'. {reason}")]
    InvalidArgument {
        key: String,
        value: String,
        reason: String,
    },

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check 'afetch config show' and the AFETCH_* environment variables.")]
    Config(String),

    /// Loading a structure into the session failed
    #[error("Load error: {0}")]
    Load(String),

    /// Interactive prompt failed or was interrupted
    #[error("Prompt error: {0}")]
    Prompt(#[from] inquire::InquireError),

    /// A background fetch task panicked or was aborted
    #[error("Background fetch failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or a request failed outright
    #[error("Network request failed: {0}. Check your internet connection and the configured base URL.")]
    Http(#[from] reqwest::Error),

    /// Config file is not valid TOML
    #[error("Failed to parse config file: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Config could not be serialized
    #[error("Failed to write config file: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Error from the shared library
    #[error(transparent)]
    Common(afetch_common::AfError),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a load error
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl From<afetch_common::AfError> for CliError {
    fn from(err: afetch_common::AfError) -> Self {
        match err {
            afetch_common::AfError::InvalidFormat(format) => Self::InvalidFormat(format),
            afetch_common::AfError::Io(io) => Self::Io(io),
            other => Self::Common(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_format_is_lifted() {
        let err: CliError = afetch_common::AfError::InvalidFormat("xyz".to_string()).into();
        assert!(matches!(err, CliError::InvalidFormat(ref f) if f == "xyz"));
        assert!(err.to_string().contains("pdb<N>"));
    }

    #[test]
    fn test_invalid_argument_message() {
        let err = CliError::invalid_argument("state", "two", "Expected an integer.");
        assert_eq!(
            err.to_string(),
            "Invalid value for 'state': 'two'. Expected an integer."
        );
    }
}
