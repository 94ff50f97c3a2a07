//! Relays pipeline status events into the chat as plain text.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::warn;

use crate::downloader::ProgressEvent;
use crate::pipeline::{DeliveryOutcome, PipelineStage, StatusEvent};

use super::traits::ChatPlatform;
use super::types::{ChatTarget, MessageHandle};

const BAR_CELLS: usize = 20;

/// Formats a byte count with binary units and two decimals.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{:.2} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.2} TB", value)
}

/// Compact duration such as `1h 2m`, `3m 4s` or `5s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, s) => format!("{}s", s),
        (0, m, s) => format!("{}m {}s", m, s),
        (h, m, _) => format!("{}h {}m", h, m),
    }
}

/// Fixed-width text progress bar for a percentage in `[0, 100]`.
pub fn progress_bar(percent: f32) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_CELLS as f32) as usize;
    format!(
        "[{}{}]",
        "█".repeat(filled),
        "-".repeat(BAR_CELLS - filled)
    )
}

/// Text of the download progress message.
pub fn render_progress(event: &ProgressEvent) -> String {
    let speed = format!(
        "{}/s",
        format_size(event.rate_bytes_per_sec.max(0.0) as u64)
    );

    match (event.total_bytes, event.percent()) {
        (Some(total), Some(percent)) => {
            let mut text = format!(
                "Downloading...\n{} {:.1}%\n{} of {} at {}",
                progress_bar(percent),
                percent,
                format_size(event.bytes_written),
                format_size(total),
                speed
            );
            if let Some(eta) = event.eta().filter(|_| !event.complete) {
                text.push_str(&format!(", ETA {}", format_duration(eta)));
            }
            text
        }
        _ => format!(
            "Downloading...\n{} at {}",
            format_size(event.bytes_written),
            speed
        ),
    }
}

/// Text for a non-progress event, or `None` when it is not shown.
pub fn render_event(event: &StatusEvent) -> Option<String> {
    match event {
        StatusEvent::Stage { stage, detail } => {
            let name = detail.as_deref().unwrap_or("file");
            match stage {
                PipelineStage::Downloading => Some(format!("Downloading {}...", name)),
                PipelineStage::Normalizing => Some(format!("Converting {} to mp4...", name)),
                PipelineStage::Delivering => Some(format!("Uploading {}...", name)),
                _ => None,
            }
        }
        StatusEvent::Progress(p) => Some(render_progress(p)),
        StatusEvent::Warning(message) => Some(format!("Warning: {}", message)),
        StatusEvent::Finished(DeliveryOutcome::Success(receipt)) => Some(format!(
            "Upload complete: {} ({})",
            receipt.file_name,
            format_size(receipt.size_bytes)
        )),
        StatusEvent::Finished(DeliveryOutcome::Failure { stage, reason }) => {
            Some(format!("Failed while {}: {}", stage, reason))
        }
    }
}

/// Counters describing what a relay did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    pub sent: u64,
    pub edited: u64,
    /// Platform calls that failed and were skipped.
    pub failed: u64,
}

/// Consumes [`StatusEvent`]s for one run and mirrors them in the chat.
///
/// Edits are best-effort: a failed or rate-limited call is logged and the
/// relay moves on.
pub struct StatusRelay {
    platform: Arc<dyn ChatPlatform>,
    target: ChatTarget,
    progress_message: Option<MessageHandle>,
    last_progress_text: Option<String>,
    stats: RelayStats,
}

impl StatusRelay {
    pub fn new(platform: Arc<dyn ChatPlatform>, target: ChatTarget) -> Self {
        Self {
            platform,
            target,
            progress_message: None,
            last_progress_text: None,
            stats: RelayStats::default(),
        }
    }

    /// Runs until the sender side is dropped.
    pub async fn run(mut self, mut rx: mpsc::Receiver<StatusEvent>) -> RelayStats {
        while let Some(event) = rx.recv().await {
            self.handle(&event).await;
        }
        self.stats
    }

    async fn handle(&mut self, event: &StatusEvent) {
        let Some(text) = render_event(event) else {
            return;
        };

        match event {
            StatusEvent::Stage {
                stage: PipelineStage::Downloading,
                ..
            } => {
                // Later progress edits this message.
                self.progress_message = self.send(&text).await;
                self.last_progress_text = Some(text);
            }
            StatusEvent::Progress(_) => self.update_progress(text).await,
            _ => {
                self.send(&text).await;
            }
        }
    }

    async fn update_progress(&mut self, text: String) {
        if self.last_progress_text.as_deref() == Some(text.as_str()) {
            return;
        }

        match self.progress_message {
            Some(handle) => match self.platform.edit_message(&handle, &text).await {
                Ok(()) => self.stats.edited += 1,
                Err(e) => {
                    self.stats.failed += 1;
                    warn!(error = %e, "Progress edit failed, skipping");
                }
            },
            None => self.progress_message = self.send(&text).await,
        }
        self.last_progress_text = Some(text);
    }

    async fn send(&mut self, text: &str) -> Option<MessageHandle> {
        match self.platform.send_message(&self.target, text).await {
            Ok(handle) => {
                self.stats.sent += 1;
                Some(handle)
            }
            Err(e) => {
                self.stats.failed += 1;
                warn!(chat_id = self.target.chat_id, error = %e, "Status message failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::DeliveryError;
    use crate::testing::MockChatPlatform;

    fn progress(bytes: u64, total: Option<u64>) -> ProgressEvent {
        ProgressEvent {
            bytes_written: bytes,
            total_bytes: total,
            elapsed: Duration::from_secs(1),
            rate_bytes_per_sec: bytes as f64,
            complete: false,
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(50 * 1024 * 1024), "50.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024 * 1024), "3.00 TB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(5)), "5s");
        assert_eq!(format_duration(Duration::from_secs(184)), "3m 4s");
        assert_eq!(format_duration(Duration::from_secs(3720)), "1h 2m");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0), format!("[{}]", "-".repeat(20)));
        assert_eq!(progress_bar(50.0), format!("[{}{}]", "█".repeat(10), "-".repeat(10)));
        assert_eq!(progress_bar(150.0), format!("[{}]", "█".repeat(20)));
    }

    #[test]
    fn test_render_progress_unknown_total_has_no_percentage() {
        let text = render_progress(&progress(2048, None));
        assert!(text.contains("2.00 KB"));
        assert!(!text.contains('%'));
    }

    #[test]
    fn test_render_progress_known_total() {
        let text = render_progress(&progress(512, Some(1024)));
        assert!(text.contains("50.0%"));
        assert!(text.contains("512.00 B of 1.00 KB"));
        assert!(text.contains("ETA 1s"));
    }

    #[test]
    fn test_render_failure() {
        let text = render_event(&StatusEvent::Finished(DeliveryOutcome::Failure {
            stage: PipelineStage::Downloading,
            reason: "HTTP 404: Not Found".to_string(),
        }))
        .unwrap();
        assert_eq!(text, "Failed while downloading: HTTP 404: Not Found");
    }

    #[tokio::test]
    async fn test_progress_edits_download_message() {
        let platform = Arc::new(MockChatPlatform::new());
        let relay = StatusRelay::new(platform.clone(), ChatTarget::new(1));
        let (tx, rx) = mpsc::channel(16);

        tx.send(StatusEvent::Stage {
            stage: PipelineStage::Downloading,
            detail: Some("clip.avi".to_string()),
        })
        .await
        .unwrap();
        tx.send(StatusEvent::Progress(progress(10, Some(100))))
            .await
            .unwrap();
        tx.send(StatusEvent::Progress(progress(50, Some(100))))
            .await
            .unwrap();
        drop(tx);

        let stats = relay.run(rx).await;
        assert_eq!(stats, RelayStats { sent: 1, edited: 2, failed: 0 });

        let messages = platform.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], "Downloading clip.avi...");
        assert_eq!(platform.edits().await.len(), 2);
    }

    #[tokio::test]
    async fn test_edit_failures_are_tolerated() {
        let platform = Arc::new(MockChatPlatform::new());
        platform.set_fail_edits(true).await;
        let relay = StatusRelay::new(platform.clone(), ChatTarget::new(1));
        let (tx, rx) = mpsc::channel(16);

        tx.send(StatusEvent::Stage {
            stage: PipelineStage::Downloading,
            detail: None,
        })
        .await
        .unwrap();
        tx.send(StatusEvent::Progress(progress(10, Some(100))))
            .await
            .unwrap();
        tx.send(StatusEvent::Warning("slow".to_string()))
            .await
            .unwrap();
        drop(tx);

        let stats = relay.run(rx).await;
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.sent, 2);
        assert_eq!(platform.messages().await[1], "Warning: slow");
    }

    #[tokio::test]
    async fn test_failed_send_is_skipped() {
        let platform = Arc::new(MockChatPlatform::new());
        platform
            .set_next_message_error(DeliveryError::Transport("request timed out".to_string()))
            .await;
        let relay = StatusRelay::new(platform.clone(), ChatTarget::new(1));
        let (tx, rx) = mpsc::channel(16);

        tx.send(StatusEvent::Stage {
            stage: PipelineStage::Delivering,
            detail: Some("a.zip".to_string()),
        })
        .await
        .unwrap();
        tx.send(StatusEvent::Warning("second".to_string()))
            .await
            .unwrap();
        drop(tx);

        let stats = relay.run(rx).await;
        assert_eq!(stats, RelayStats { sent: 1, edited: 0, failed: 1 });
    }
}
