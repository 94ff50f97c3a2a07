//! Delivery mode selection and upload.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::DeliveryConfig;
use crate::content::{Artifact, MimeCategory};
use crate::metrics;

use super::error::DeliveryError;
use super::traits::ChatPlatform;
use super::types::{ChatTarget, DeliveryMode, DeliveryReceipt, Upload};

/// Picks the delivery primitive for an artifact.
///
/// Inline video only for videos strictly below `threshold` bytes.
pub fn select_mode(category: MimeCategory, size_bytes: u64, threshold: u64) -> DeliveryMode {
    if category.is_video() && size_bytes < threshold {
        DeliveryMode::InlineVideo
    } else {
        DeliveryMode::Document
    }
}

/// Uploads finished artifacts to a chat platform.
#[derive(Clone)]
pub struct DeliveryDispatcher {
    platform: Arc<dyn ChatPlatform>,
    config: DeliveryConfig,
}

impl DeliveryDispatcher {
    pub fn new(platform: Arc<dyn ChatPlatform>, config: DeliveryConfig) -> Self {
        Self { platform, config }
    }

    /// Mode this dispatcher would use for `artifact`.
    pub fn mode_for(&self, artifact: &Artifact) -> DeliveryMode {
        select_mode(
            artifact.category,
            artifact.size_bytes,
            self.config.inline_video_max_bytes,
        )
    }

    /// Uploads `artifact` to `target` under `display_name`.
    ///
    /// A thumbnail is attached only to document uploads and only if the file
    /// still exists; a stale reference is dropped.
    pub async fn deliver(
        &self,
        artifact: &Artifact,
        target: &ChatTarget,
        display_name: &str,
        thumbnail: Option<&Path>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let mode = self.mode_for(artifact);

        let thumbnail = match (mode, thumbnail) {
            (DeliveryMode::Document, Some(path)) => {
                if tokio::fs::try_exists(path).await.unwrap_or(false) {
                    Some(path.to_path_buf())
                } else {
                    debug!(path = %path.display(), "Thumbnail no longer exists, sending without it");
                    None
                }
            }
            _ => None,
        };
        let thumbnail_attached = thumbnail.is_some();

        let upload = Upload {
            path: artifact.path.clone(),
            file_name: display_name.to_string(),
            size_bytes: artifact.size_bytes,
            caption: self.config.caption.clone(),
            thumbnail,
            disable_notification: self.config.disable_notification,
        };

        info!(
            platform = self.platform.name(),
            chat_id = target.chat_id,
            mode = %mode,
            bytes = artifact.size_bytes,
            file_name = %display_name,
            "Delivering artifact"
        );

        let result = match mode {
            DeliveryMode::InlineVideo => self.platform.send_video(target, upload).await,
            DeliveryMode::Document => self.platform.send_document(target, upload).await,
        };

        match result {
            Ok(message) => {
                metrics::DELIVERIES_TOTAL
                    .with_label_values(&[mode.as_str(), "success"])
                    .inc();
                Ok(DeliveryReceipt {
                    mode,
                    message,
                    file_name: display_name.to_string(),
                    size_bytes: artifact.size_bytes,
                    thumbnail_attached,
                })
            }
            Err(e) => {
                metrics::DELIVERIES_TOTAL
                    .with_label_values(&[mode.as_str(), "failed"])
                    .inc();
                warn!(mode = %mode, error = %e, "Delivery failed");
                Err(e)
            }
        }
    }
}
