//! Error taxonomy for archive-backed filesystem operations.

use std::io;

use thiserror::Error;

use crate::zip::ZipError;

/// Broad failure class of a [`ZipFsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    IsDirectory,
    NotADirectory,
    Corrupt,
    Unsupported,
    IdentityMismatch,
    Io,
}

/// Errors raised by [`ZipFs`](crate::ZipFs) and [`Mount`](crate::Mount).
///
/// Every variant names the archive it came from so that messages stay
/// meaningful once they leave the filesystem layer.
#[derive(Debug, Error)]
pub enum ZipFsError {
    #[error("not found: {path} @{archive}")]
    NotFound { path: String, archive: String },

    #[error("is directory: {path} @{archive}")]
    IsDirectory { path: String, archive: String },

    #[error("not a directory: {path} @{archive}")]
    NotADirectory { path: String, archive: String },

    #[error("corrupt archive ({source}) while resolving {path:?} @{archive}")]
    Corrupt {
        path: String,
        archive: String,
        #[source]
        source: ZipError,
    },

    #[error("not implemented: {reason} ({path}) @{archive}")]
    Unsupported {
        path: String,
        archive: String,
        reason: String,
    },

    #[error("mismatch: archive was replaced while mounted @{archive}")]
    IdentityMismatch { archive: String },

    #[error("I/O error @{archive}: {source}")]
    Io {
        archive: String,
        #[source]
        source: io::Error,
    },

    #[error("{path}: {source}")]
    Host {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Result type alias for filesystem operations.
pub type Result<T> = std::result::Result<T, ZipFsError>;

impl ZipFsError {
    /// Wrap a low-level format error with the path being served.
    pub(crate) fn from_zip(source: ZipError, path: &str, archive: &str) -> Self {
        match source {
            ZipError::Io(source) => ZipFsError::Io {
                archive: archive.to_owned(),
                source,
            },
            ZipError::UnsupportedMethod(_) | ZipError::Encrypted => ZipFsError::Unsupported {
                path: path.to_owned(),
                archive: archive.to_owned(),
                reason: source.to_string(),
            },
            source => ZipFsError::Corrupt {
                path: path.to_owned(),
                archive: archive.to_owned(),
                source,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ZipFsError::NotFound { .. } => ErrorKind::NotFound,
            ZipFsError::IsDirectory { .. } => ErrorKind::IsDirectory,
            ZipFsError::NotADirectory { .. } => ErrorKind::NotADirectory,
            ZipFsError::Corrupt { .. } => ErrorKind::Corrupt,
            ZipFsError::Unsupported { .. } => ErrorKind::Unsupported,
            ZipFsError::IdentityMismatch { .. } => ErrorKind::IdentityMismatch,
            ZipFsError::Io { .. } => ErrorKind::Io,
            ZipFsError::Host { source, .. } => match source.kind() {
                io::ErrorKind::NotFound => ErrorKind::NotFound,
                io::ErrorKind::IsADirectory => ErrorKind::IsDirectory,
                io::ErrorKind::NotADirectory => ErrorKind::NotADirectory,
                _ => ErrorKind::Io,
            },
        }
    }

    /// POSIX-style error code, as a module loader would expect to see it.
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NotFound => "ENOENT",
            ErrorKind::IsDirectory => "EISDIR",
            ErrorKind::NotADirectory => "ENOTDIR",
            ErrorKind::Corrupt => "EBADF",
            ErrorKind::Unsupported => "ENOSYS",
            ErrorKind::IdentityMismatch => "ESTALE",
            ErrorKind::Io => "EIO",
        }
    }

    /// Cached offsets can no longer be trusted; the process must not go on
    /// serving reads from this archive.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ZipFsError::IdentityMismatch { .. })
    }
}

impl From<ZipFsError> for io::Error {
    fn from(err: ZipFsError) -> Self {
        let kind = match err.kind() {
            ErrorKind::NotFound => io::ErrorKind::NotFound,
            ErrorKind::IsDirectory => io::ErrorKind::IsADirectory,
            ErrorKind::NotADirectory => io::ErrorKind::NotADirectory,
            ErrorKind::Corrupt => io::ErrorKind::InvalidData,
            ErrorKind::Unsupported => io::ErrorKind::Unsupported,
            ErrorKind::IdentityMismatch => io::ErrorKind::Other,
            ErrorKind::Io => match &err {
                ZipFsError::Io { source, .. } | ZipFsError::Host { source, .. } => source.kind(),
                _ => io::ErrorKind::Other,
            },
        };
        io::Error::new(kind, err)
    }
}
