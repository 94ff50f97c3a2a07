//! Mock transcoder for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::converter::{ConverterError, TranscodeJob, TranscodeResult, Transcoder};

/// A recorded transcode job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedTranscode {
    /// The job that was submitted.
    pub job: TranscodeJob,
    /// Whether the transcode succeeded.
    pub success: bool,
}

/// Mock implementation of the Transcoder trait.
///
/// Provides controllable behavior for testing:
/// - Track transcode jobs for assertions
/// - Simulate success (the input is copied to the output path) or failure
/// - Simulate slow transcodes to exercise cancellation
///
/// # Example
///
/// ```rust,ignore
/// use uplink_core::testing::MockTranscoder;
///
/// let transcoder = MockTranscoder::new();
/// transcoder.set_next_error(ConverterError::conversion_failed("boom", None)).await;
///
/// // ... run a pipeline ...
///
/// let jobs = transcoder.recorded_transcodes().await;
/// assert!(!jobs[0].success);
/// ```
#[derive(Debug)]
pub struct MockTranscoder {
    /// Recorded transcodes.
    transcodes: Arc<RwLock<Vec<RecordedTranscode>>>,
    /// If set, the next transcode will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    /// Simulated transcode duration.
    delay: Arc<RwLock<Duration>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    /// Create a new mock transcoder.
    pub fn new() -> Self {
        Self {
            transcodes: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Get all recorded transcodes.
    pub async fn recorded_transcodes(&self) -> Vec<RecordedTranscode> {
        self.transcodes.read().await.clone()
    }

    /// Get the number of transcodes attempted.
    pub async fn transcode_count(&self) -> usize {
        self.transcodes.read().await.len()
    }

    /// Configure the next transcode to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the simulated transcode duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    async fn record(&self, job: TranscodeJob, success: bool) {
        self.transcodes
            .write()
            .await
            .push(RecordedTranscode { job, success });
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcode(
        &self,
        job: TranscodeJob,
        cancel: &CancellationToken,
    ) -> Result<TranscodeResult, ConverterError> {
        if let Some(err) = self.next_error.write().await.take() {
            self.record(job, false).await;
            return Err(err);
        }

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.record(job, false).await;
                    return Err(ConverterError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if !tokio::fs::try_exists(&job.input_path).await.unwrap_or(false) {
            self.record(job.clone(), false).await;
            return Err(ConverterError::InputNotFound {
                path: job.input_path,
            });
        }

        let output_size_bytes = tokio::fs::copy(&job.input_path, &job.output_path).await?;
        self.record(job.clone(), true).await;

        Ok(TranscodeResult {
            job_id: job.job_id,
            output_path: job.output_path,
            output_size_bytes,
            duration_ms: delay.as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copies_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.avi");
        tokio::fs::write(&input, b"frames").await.unwrap();

        let transcoder = MockTranscoder::new();
        let job = TranscodeJob::new("t", &input, dir.path().join("in.mp4"));
        let result = transcoder
            .transcode(job, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.output_size_bytes, 6);
        assert_eq!(transcoder.transcode_count().await, 1);
    }

    #[tokio::test]
    async fn test_next_error_is_used_once() {
        let transcoder = MockTranscoder::new();
        transcoder
            .set_next_error(ConverterError::conversion_failed("boom", None))
            .await;

        let job = TranscodeJob::new("t", "/nonexistent/a.avi", "/nonexistent/a.mp4");
        let first = transcoder
            .transcode(job.clone(), &CancellationToken::new())
            .await;
        assert!(matches!(first, Err(ConverterError::ConversionFailed { .. })));

        let second = transcoder.transcode(job, &CancellationToken::new()).await;
        assert!(matches!(second, Err(ConverterError::InputNotFound { .. })));
    }
}
