//! Error types for ringkv

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Wire Errors ===
    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),

    // === Placement Errors ===
    #[error("Insufficient replicas: need {needed}, have {available}")]
    InsufficientReplicas { needed: usize, available: usize },

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config source error: {0}")]
    Config(#[from] ::config::ConfigError),

    // === Generic ===
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Is this a retryable error?
    ///
    /// An unavailable replica set clears once membership grows back to three
    /// members, so callers may re-issue the operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::InsufficientReplicas { .. })
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_replicas_is_retryable() {
        let err = Error::InsufficientReplicas {
            needed: 3,
            available: 2,
        };
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Insufficient replicas: need 3, have 2");
    }

    #[test]
    fn test_other_errors_not_retryable() {
        assert!(!Error::InvalidConfig("ring_size".into()).is_retryable());
        assert!(!Error::from("boom").is_retryable());
    }
}
