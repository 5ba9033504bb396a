//! Unlocker errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring the unlocker or talking to the daemon.
#[derive(Debug, Error)]
pub enum UnlockerError {
    /// A flag or environment value is invalid.
    #[error("invalid flag: {0}")]
    InvalidConfig(String),

    /// The secret provider is misconfigured.
    #[error("provider error: {0}")]
    Provider(String),

    /// A secret file could not be read.
    #[error("unable to read {path}: {source}")]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The daemon could not be reached.
    #[error("unable to connect to RPC server: {0}")]
    Transport(String),

    /// The daemon rejected the request.
    #[error("RPC failed with status {status}: {message}")]
    Rpc {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// The daemon answered with an unexpected payload.
    #[error("invalid RPC response: {0}")]
    Decode(String),
}
