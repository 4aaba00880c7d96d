use thiserror::Error;

/// The universal error type for the Tern client core.
#[derive(Error, Debug)]
pub enum TernError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("XMPP error: {0}")]
    Xmpp(String),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for Tern operations.
pub type Result<T> = std::result::Result<T, TernError>;
