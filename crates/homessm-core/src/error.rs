//! Error types for the HomeSSM core.

/// Core error type for configuration and identity handling.
#[derive(Debug, thiserror::Error)]
pub enum HomeSsmError {
    /// Invalid AWS account ID format.
    #[error("invalid AWS account ID: {0} (must be 12-digit numeric string)")]
    InvalidAccountId(String),

    /// The configuration file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    ReadConfig {
        /// Path that was being read.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`crate::HomeSsmConfig`].
    #[error("failed to parse config: {0}")]
    ParseConfig(#[from] serde_yaml::Error),

    /// The configuration parsed but is semantically invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for core operations.
pub type HomeSsmResult<T> = Result<T, HomeSsmError>;
