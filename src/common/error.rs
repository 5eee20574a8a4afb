use std::net::SocketAddr;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("query for {name} via {server} timed out")]
    Timeout { name: String, server: SocketAddr },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("config error: {0}")]
    Config(String),
}

impl SiftError {
    /// Whether this error is transient and the query should be attempted again.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Get the kind/category of this error.
    pub fn kind(&self) -> SiftErrorKind {
        match self {
            SiftError::Io(e) => io_kind(e),
            SiftError::Timeout { .. } => SiftErrorKind::Timeout,
            SiftError::Protocol(_) => SiftErrorKind::Protocol,
            SiftError::Config(_) => SiftErrorKind::Config,
        }
    }
}

fn io_kind(err: &std::io::Error) -> SiftErrorKind {
    match err.kind() {
        std::io::ErrorKind::TimedOut => SiftErrorKind::Timeout,
        _ => SiftErrorKind::Io,
    }
}

/// Lightweight error category for pattern matching without borrowing the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiftErrorKind {
    Io,
    Timeout,
    Protocol,
    Config,
}

impl SiftErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, SiftErrorKind::Timeout)
    }
}

impl From<hickory_resolver::proto::error::ProtoError> for SiftError {
    fn from(e: hickory_resolver::proto::error::ProtoError) -> Self {
        SiftError::Protocol(e.to_string())
    }
}
