//! Error types for source resolution.

use thiserror::Error;

/// Errors raised before any network transfer starts.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Not a well-formed http/https URL.
    #[error("Invalid URL: {reason}")]
    InvalidUrl { reason: String },

    /// A provider link whose file identifier cannot be extracted.
    #[error("Cannot extract a file id from provider link: {url}")]
    Unresolvable { url: String },
}

impl SourceError {
    pub fn invalid_url(reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            reason: reason.into(),
        }
    }
}
