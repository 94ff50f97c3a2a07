//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Transcoder;
use super::types::{TranscodeJob, TranscodeResult};

/// Lines of ffmpeg stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// FFmpeg-based transcoder producing streaming-friendly mp4.
pub struct FfmpegTranscoder {
    config: ConverterConfig,
}

enum RunOutcome {
    Finished(std::io::Result<(std::process::ExitStatus, String)>),
    TimedOut,
    Cancelled,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Builds the fixed ffmpeg argument list for mp4 normalization.
    fn build_args(&self, input_path: &Path, output_path: &Path) -> Vec<String> {
        vec![
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "fast".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            output_path.to_string_lossy().to_string(),
        ]
    }

    fn spawn_error(&self, e: std::io::Error) -> ConverterError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConverterError::FfmpegNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            ConverterError::Io(e)
        }
    }

    async fn run(
        &self,
        job: &TranscodeJob,
        cancel: &CancellationToken,
    ) -> Result<TranscodeResult, ConverterError> {
        let start = Instant::now();

        if !tokio::fs::try_exists(&job.input_path).await.unwrap_or(false) {
            return Err(ConverterError::InputNotFound {
                path: job.input_path.clone(),
            });
        }

        let args = self.build_args(&job.input_path, &job.output_path);
        debug!(job_id = %job.job_id, ?args, "Spawning ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ConverterError::conversion_failed("stderr was not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let wait = async {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            while let Some(line) = reader.next_line().await? {
                if line.trim().is_empty() {
                    continue;
                }
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }

            let status = child.wait().await?;
            let error_output = tail.into_iter().collect::<Vec<_>>().join("\n");
            Ok::<_, std::io::Error>((status, error_output))
        };

        // A timeout of 0 disables the limit
        let limited = async {
            match self.config.timeout_secs {
                0 => Some(wait.await),
                secs => timeout(Duration::from_secs(secs), wait).await.ok(),
            }
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => RunOutcome::Cancelled,
            result = limited => match result {
                Some(finished) => RunOutcome::Finished(finished),
                None => RunOutcome::TimedOut,
            },
        };

        let failure = match outcome {
            RunOutcome::Finished(Ok((status, error_output))) => {
                if status.success() {
                    None
                } else {
                    Some(ConverterError::conversion_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if error_output.is_empty() {
                            None
                        } else {
                            Some(error_output)
                        },
                    ))
                }
            }
            RunOutcome::Finished(Err(e)) => Some(ConverterError::Io(e)),
            RunOutcome::TimedOut => {
                let _ = child.kill().await;
                Some(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
            RunOutcome::Cancelled => {
                let _ = child.kill().await;
                Some(ConverterError::Cancelled)
            }
        };

        if let Some(err) = failure {
            self.discard_output(&job.output_path).await;
            return Err(err);
        }

        // Verify output exists and get size
        let output_meta = match tokio::fs::metadata(&job.output_path).await {
            Ok(meta) if meta.len() > 0 => meta,
            _ => {
                self.discard_output(&job.output_path).await;
                return Err(ConverterError::conversion_failed(
                    "Output file not created",
                    None,
                ));
            }
        };

        let result = TranscodeResult {
            job_id: job.job_id.clone(),
            output_path: job.output_path.clone(),
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            job_id = %job.job_id,
            output_bytes = result.output_size_bytes,
            duration_ms = result.duration_ms,
            "Transcode completed"
        );

        Ok(result)
    }

    async fn discard_output(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "Failed to remove partial transcode output");
            }
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transcode(
        &self,
        job: TranscodeJob,
        cancel: &CancellationToken,
    ) -> Result<TranscodeResult, ConverterError> {
        self.run(&job, cancel).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ConverterError::conversion_failed(
                "ffmpeg -version returned a failure status",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }

        Ok(())
    }
}
