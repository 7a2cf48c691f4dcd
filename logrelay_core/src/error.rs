//! Error taxonomy shared by every logrelay crate.
//!
//! Boundaries switch on [`ErrorKind`] rather than on message text or raw
//! status numbers.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;

/// HTTP status the upstream uses when it is temporarily overloaded.
pub const OVERLOADED_STATUS: u16 = 503;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("filesystem error on {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("conversation is busy with another turn")]
    Busy,
}

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Upstream(e) if e.is_overloaded() => ErrorKind::Overloaded,
            Self::Upstream(_) => ErrorKind::Upstream,
            Self::Filesystem { .. } => ErrorKind::Filesystem,
            Self::Busy => ErrorKind::Busy,
        }
    }
}

/// Failure category, used by boundaries to pick a status and a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    /// Upstream answered with the overload status.
    Overloaded,
    Upstream,
    Filesystem,
    Busy,
}

impl ErrorKind {
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::Overloaded => OVERLOADED_STATUS,
            Self::Busy => 429,
            Self::Upstream | Self::Filesystem => 500,
        }
    }
}

/// A failed upstream attempt.
///
/// `status` is `None` for transport failures where no response arrived.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("upstream request failed{}: {message}", .status.map(|s| format!(" with status {s}")).unwrap_or_default())]
pub struct UpstreamError {
    pub status: Option<u16>,
    pub message: String,
}

impl UpstreamError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    #[must_use]
    pub const fn is_overloaded(&self) -> bool {
        matches!(self.status, Some(OVERLOADED_STATUS))
    }
}
