//! Error types for the download module.
//!
//! [`DownloadError`] covers everything that can go wrong for a single target.
//! These errors never escape a worker; they are carried in a
//! [`DownloadOutcome`](super::DownloadOutcome) instead. [`DispatchError`] covers
//! the setup failures that stop a run before any worker starts.

use std::path::PathBuf;

use thiserror::Error;

use super::constants::{MAX_POOL_SIZE, MIN_POOL_SIZE};

/// Errors that can occur while downloading a single target.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion, either waiting for the response
    /// or while the body was streaming.
    #[error("timeout downloading {url} after {bytes_written} bytes")]
    Timeout {
        /// The URL that timed out.
        url: String,
        /// Bytes flushed to the destination before the deadline passed.
        bytes_written: u64,
        /// The transport error, of kind [`std::io::ErrorKind::TimedOut`].
        #[source]
        source: std::io::Error,
    },

    /// Response status outside the accepted set (200, 206, 301, 302).
    #[error("unexpected status code {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// No destination name or directory could be obtained.
    #[error("cannot resolve destination for {url}: {source}")]
    Naming {
        /// The URL being saved.
        url: String,
        /// The collaborator failure.
        #[source]
        source: NamingError,
    },

    /// Creating the destination file failed.
    #[error("cannot create {path}: {source}")]
    Filesystem {
        /// The file path that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The transfer broke off after the file was created.
    #[error("error writing {path} after {bytes_written} bytes: {source}")]
    StreamCopy {
        /// Destination file (left on disk with the partial content).
        path: PathBuf,
        /// Bytes flushed to the file before the failure.
        bytes_written: u64,
        /// The underlying read or write error.
        #[source]
        source: std::io::Error,
    },

    /// The run was cancelled before this target completed.
    #[error("download of {url} cancelled")]
    Cancelled {
        /// The URL whose download was abandoned.
        url: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timeout(
                url,
                0,
                std::io::Error::new(std::io::ErrorKind::TimedOut, source),
            );
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>, bytes_written: u64, source: std::io::Error) -> Self {
        Self::Timeout {
            url: url.into(),
            bytes_written,
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a naming/path error.
    pub fn naming(url: impl Into<String>, source: NamingError) -> Self {
        Self::Naming {
            url: url.into(),
            source,
        }
    }

    /// Creates a file creation error.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Creates a mid-transfer error.
    pub fn stream_copy(
        path: impl Into<PathBuf>,
        bytes_written: u64,
        source: std::io::Error,
    ) -> Self {
        Self::StreamCopy {
            path: path.into(),
            bytes_written,
            source,
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }

    /// Returns the HTTP status code for status failures.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the failure was a request timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Bytes that reached the destination before the failure.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        match self {
            Self::StreamCopy { bytes_written, .. } | Self::Timeout { bytes_written, .. } => {
                *bytes_written
            }
            _ => 0,
        }
    }

    /// Short stable label for the failure kind, used in summary lines.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::HttpStatus { .. } => "http-status",
            Self::InvalidUrl { .. } => "invalid-url",
            Self::Naming { .. } => "naming",
            Self::Filesystem { .. } => "filesystem",
            Self::StreamCopy { .. } => "stream-copy",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}

/// Failures of the naming and directory collaborators.
#[derive(Debug, Error)]
pub enum NamingError {
    /// Reading the save-as answer failed.
    #[error("cannot read destination name: {0}")]
    Input(#[source] std::io::Error),

    /// Input ended before a name was supplied.
    #[error("no destination name supplied")]
    EndOfInput,

    /// The supplied name is empty or only whitespace.
    #[error("destination name is empty")]
    EmptyName,

    /// The supplied name would escape the destination directory.
    #[error("destination name {0:?} is not a plain file name")]
    UnsafeName(String),

    /// The destination directory could not be determined or created.
    #[error("cannot access directory {path}: {source}")]
    Directory {
        /// The directory that was being resolved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A blocking collaborator task panicked or was aborted.
    #[error("destination lookup did not complete: {0}")]
    Interrupted(String),
}

/// Setup errors that stop a run before any worker starts.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Invalid pool size provided.
    #[error("invalid pool size {value}: must be between {MIN_POOL_SIZE} and {MAX_POOL_SIZE}")]
    InvalidPoolSize {
        /// The invalid value that was provided.
        value: usize,
    },

    /// The HTTP client could not be built.
    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The collector task panicked before producing a summary.
    #[error("result collector stopped unexpectedly: {0}")]
    Collector(String),
}
