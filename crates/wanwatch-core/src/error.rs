//! Error types for the watcher
//!
//! Each component seam has its own error kind so the engine can log a
//! failure with its cause and absorb it into the cycle outcome instead of
//! propagating it. Only configuration problems surface as fatal errors.

use thiserror::Error;

/// Result type alias for watcher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the address source
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (timeout, connection refused, TLS)
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote API answered with a non-success status
    #[error("remote returned status {status}: {body}")]
    RemoteError {
        /// HTTP status code
        status: u16,
        /// Response body as received, kept for diagnosis
        body: String,
    },

    /// The response arrived but did not have the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a malformed-response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }
}

/// Errors from the notifier
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The mail server rejected the configured credentials
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Transport-level failure (connect, timeout, TLS)
    #[error("transport failure: {0}")]
    Transport(String),

    /// The delivery session failed at the protocol level
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Errors from the state store
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O failure while writing the durable record
    #[error("state I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The state path is not writable by this process
    #[error("state file permission denied: {0}")]
    Permission(String),
}

impl StoreError {
    /// Map an I/O error, splitting out permission problems
    pub fn from_io(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            Self::Permission(err.to_string())
        } else {
            Self::Io(err)
        }
    }
}

/// Top-level error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (the only process-fatal kind)
    #[error("configuration error: {0}")]
    Config(String),

    /// Address fetch errors
    #[error("address fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Notification errors
    #[error("notification error: {0}")]
    Notify(#[from] NotifyError),

    /// State store errors
    #[error("state store error: {0}")]
    Store(#[from] StoreError),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
