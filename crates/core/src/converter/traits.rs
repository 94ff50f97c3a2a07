//! Trait definitions for the converter module.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::ConverterError;
use super::types::{TranscodeJob, TranscodeResult};

/// A transcoder that normalizes videos into the canonical delivery format.
///
/// Implementations must leave `job.input_path` untouched and must not leave a
/// partial file at `job.output_path` when they fail.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Transcodes `job.input_path` into `job.output_path`.
    async fn transcode(
        &self,
        job: TranscodeJob,
        cancel: &CancellationToken,
    ) -> Result<TranscodeResult, ConverterError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}
