//! Error types for SSH argument building

use thiserror::Error;

/// Main error type for SSH argument building
#[derive(Debug, Error)]
pub enum SshArgsError {
    /// Every multiplexing control path candidate exceeded the socket path limit
    #[error("The multiplexing control path for {host} is too long. Control path is: {path}")]
    ControlPathTooLong {
        /// Connection data (host identifier followed by port)
        host: String,
        /// Last candidate that was tried
        path: String,
    },

    /// Invalid command-line configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed defaults file
    #[error("Invalid defaults: {0}")]
    Defaults(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using SshArgsError
pub type Result<T> = std::result::Result<T, SshArgsError>;

impl SshArgsError {
    /// Create a control path error for a host/path pair
    pub fn control_path_too_long(host: impl Into<String>, path: impl Into<String>) -> Self {
        SshArgsError::ControlPathTooLong {
            host: host.into(),
            path: path.into(),
        }
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        SshArgsError::Config(msg.into())
    }

    /// Create a defaults error from a string
    pub fn defaults(msg: impl Into<String>) -> Self {
        SshArgsError::Defaults(msg.into())
    }
}
