//! Types for the converter module.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single normalization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeJob {
    /// Identifier used in logs (the pipeline run id).
    pub job_id: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl TranscodeJob {
    pub fn new(
        job_id: impl Into<String>,
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            input_path: input_path.into(),
            output_path: output_path.into(),
        }
    }
}

/// Result of a successful transcode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeResult {
    pub job_id: String,
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
    pub duration_ms: u64,
}
