//! Error types for membership-registry.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the registry.
///
/// Unverifiable payments and failed provenance derivations are *not* errors;
/// they are reported as zero amounts and [`crate::Derivation`] values.
#[derive(Debug, Error)]
pub enum Error {
    /// Raw transaction is not valid hex or not a consensus-encoded transaction.
    #[error("decode error: {0}")]
    Decode(String),

    /// Address cannot be resolved to a locking script for the requested network.
    #[error("address error: {0}")]
    Address(String),

    /// Inscription id is not of the form `<64-hex-txid>i<index>`.
    #[error("invalid inscription id: {0}")]
    InvalidInscriptionId(String),

    /// Upstream data source refused the request or answered with garbage.
    #[error("network error: {0}")]
    Network(String),

    /// An upstream fetch exceeded its time bound.
    #[error("upstream fetch timed out after {0:?}")]
    Timeout(Duration),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true when the error means "could not determine" rather than
    /// a caller mistake.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
