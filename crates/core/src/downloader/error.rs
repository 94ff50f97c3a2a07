//! Error types for the downloader module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching a source.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request could not be completed (connect, timeout, reset).
    #[error("Transfer failed: {0}")]
    Transport(String),

    /// Writing the destination file failed. The path stays out of the
    /// message, which is shown to the requesting user.
    #[error("Failed to write the download: {}", .source.kind())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    /// The download was cancelled.
    #[error("Download cancelled")]
    Cancelled,
}

impl DownloadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short, internals-free description of a reqwest failure.
    pub fn transport(err: &reqwest::Error) -> Self {
        let description = if err.is_timeout() {
            "request timed out"
        } else if err.is_connect() {
            "could not connect to server"
        } else if err.is_body() || err.is_decode() {
            "connection interrupted while receiving data"
        } else if err.is_redirect() {
            "too many redirects"
        } else {
            "request failed"
        };
        Self::Transport(description.to_string())
    }}
