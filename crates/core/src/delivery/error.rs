//! Error types for the delivery module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while talking to the chat platform.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The platform rejected the call.
    #[error("Platform error {code}: {description}")]
    Platform { code: i64, description: String },

    /// The upload exceeds what the platform accepts.
    #[error("File too large for the chat platform")]
    PayloadTooLarge,

    /// The request never produced a usable response.
    #[error("Upload failed: {0}")]
    Transport(String),

    /// The platform answered with something we could not interpret.
    #[error("Unexpected platform response: {0}")]
    UnexpectedResponse(String),

    /// Local file access failed (artifact, thumbnail or a received file).
    #[error("Local file access failed: {}", .source.kind())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeliveryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short description of a reqwest failure. The request URL is dropped
    /// because it embeds the bot token.
    pub fn transport(err: reqwest::Error) -> Self {
        let description = if err.is_timeout() {
            "request timed out"
        } else if err.is_connect() {
            "could not connect to chat platform"
        } else if err.is_body() || err.is_request() {
            "connection interrupted while sending data"
        } else {
            "request failed"
        };
        Self::Transport(description.to_string())
    }
}
