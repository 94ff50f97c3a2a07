//! Error types for the pipeline module.

use std::path::PathBuf;
use thiserror::Error;

use crate::delivery::DeliveryError;
use crate::downloader::DownloadError;
use crate::source::SourceError;

use super::types::PipelineStage;

/// Errors that end a pipeline run.
///
/// Transcode failures never appear here; they are recovered by delivering
/// the original file.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Download(DownloadError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Local filesystem failure outside the downloader.
    #[error("Local file operation failed: {}", .source.kind())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stage reported for this failure when `current` was active.
    pub fn stage(&self, current: PipelineStage) -> PipelineStage {
        match self {
            Self::Source(_) => PipelineStage::Resolving,
            Self::Download(_) => PipelineStage::Downloading,
            Self::Delivery(_) => PipelineStage::Delivering,
            Self::Io { .. } | Self::Cancelled => current,
        }
    }

    /// Whether the failure was caused by the request itself.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Source(_))
    }
}

impl From<DownloadError> for PipelineError {
    fn from(e: DownloadError) -> Self {
        match e {
            DownloadError::Cancelled => Self::Cancelled,
            other => Self::Download(other),
        }
    }
}
