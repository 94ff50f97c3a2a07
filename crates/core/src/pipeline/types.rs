//! Types for the pipeline module.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::delivery::{ChatTarget, DeliveryReceipt};
use crate::downloader::ProgressEvent;
use crate::preferences::JobPreferences;

/// Pipeline state machine.
///
/// `Idle → Resolving → Downloading → Classifying → (Normalizing) →
/// Delivering → Cleanup → Done | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Resolving,
    Downloading,
    Classifying,
    Normalizing,
    Delivering,
    Cleanup,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Downloading => "downloading",
            Self::Classifying => "classifying",
            Self::Normalizing => "normalizing",
            Self::Delivering => "delivering",
            Self::Cleanup => "cleanup",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request handed to the pipeline by the chat front end.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub source_url: String,
    pub target: ChatTarget,
    pub preferences: JobPreferences,
}

impl PipelineRequest {
    pub fn new(source_url: impl Into<String>, target: ChatTarget) -> Self {
        Self {
            source_url: source_url.into(),
            target,
            preferences: JobPreferences::default(),
        }
    }

    pub fn with_preferences(mut self, preferences: JobPreferences) -> Self {
        self.preferences = preferences;
        self
    }
}

/// Terminal result of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Success(DeliveryReceipt),
    /// `reason` is a short user-facing description.
    Failure {
        stage: PipelineStage,
        reason: String,
    },
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Lifecycle notifications emitted while a run progresses.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    /// The pipeline entered `stage`. `detail` names the file when known.
    Stage {
        stage: PipelineStage,
        detail: Option<String>,
    },
    /// Throttled download progress.
    Progress(ProgressEvent),
    /// Non-fatal problem, e.g. a failed transcode.
    Warning(String),
    /// Last event of every run, sent after cleanup.
    Finished(DeliveryOutcome),
}

/// Summary returned to the caller of a run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub outcome: DeliveryOutcome,
    pub final_stage: PipelineStage,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_stages() {
        assert!(PipelineStage::Done.is_terminal());
        assert!(PipelineStage::Failed.is_terminal());
        assert!(!PipelineStage::Cleanup.is_terminal());
    }

    #[test]
    fn test_failure_outcome_serialization() {
        let outcome = DeliveryOutcome::Failure {
            stage: PipelineStage::Downloading,
            reason: "HTTP 404: Not Found".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["stage"], "downloading");
    }
}
