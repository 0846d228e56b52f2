//! Error types for the MallarDB storage layer.

use std::fmt;
use std::io;

/// The result type used throughout MallarDB.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for storage operations.
#[derive(Debug)]
pub enum Error {
    /// An I/O error surfaced by the file collaborator (open, seek,
    /// short read/write, sync failure).
    Io(io::Error),

    /// Data corruption was detected.
    Corruption(String),

    /// A block or header checksum did not match its payload.
    ChecksumMismatch {
        /// The checksum stored on disk.
        expected: u64,
        /// The checksum computed over the payload that was read.
        actual: u64,
    },

    /// The on-disk main header carries a version this build cannot read.
    VersionMismatch {
        /// The version found in the file.
        found: u64,
        /// The version this build supports.
        supported: u64,
    },

    /// The database file was not found.
    NotFound(String),

    /// An invalid argument was provided.
    InvalidArgument(String),
}

impl Error {
    /// Creates a new corruption error.
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::Corruption(msg.into())
    }

    /// Creates a new not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Corruption(msg) => write!(f, "Data corruption: {}", msg),
            Error::ChecksumMismatch { expected, actual } => {
                write!(f, "Checksum mismatch: stored {:#x}, computed {:#x}", expected, actual)
            }
            Error::VersionMismatch { found, supported } => write!(
                f,
                "Version mismatch: file has version {}, but only version {} can be read",
                found, supported
            ),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
