//! Error type returned by the transfer handle, the sinks and the init guard.

use std::fmt;
use std::io;

/// Failure (or the expected "not modified" outcome) of a cget operation.
/// Nothing is retried internally; every variant reaches the immediate caller.
#[derive(Debug)]
pub enum Error {
    /// Global transfer-library setup failed or was attempted twice.
    Init(String),
    /// libcurl reported a failure (DNS, connect, TLS, malformed response,
    /// or a transfer aborted because a sink rejected a chunk).
    Transport(curl::Error),
    /// The conditional request confirmed the resource is unchanged.
    /// Callers should keep using their cached copy.
    NotModified,
    /// The server answered with a status >= 400.
    Http { url: String, status: u32 },
    /// A sink was used in a way its destination cannot support.
    Usage(String),
    /// A stream-backed sink failed to write to its destination.
    Io(io::Error),
}

impl Error {
    /// True for the not-modified outcome, which is not a fault.
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Error::NotModified)
    }

    /// HTTP status carried by an `Http` error.
    pub fn http_status(&self) -> Option<u32> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Init(msg) => write!(f, "transfer library initialization: {}", msg),
            Error::Transport(e) => write!(f, "transfer failed: {}", e),
            Error::NotModified => write!(f, "not modified since last retrieval"),
            Error::Http { url, status } => {
                write!(f, "GET {} failed with HTTP {}", url, status)
            }
            Error::Usage(msg) => write!(f, "usage: {}", msg),
            Error::Io(e) => write!(f, "output stream: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Transport(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::Init(_) | Error::NotModified | Error::Http { .. } | Error::Usage(_) => None,
        }
    }
}

impl From<curl::Error> for Error {
    fn from(e: curl::Error) -> Self {
        Error::Transport(e)
    }
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;
