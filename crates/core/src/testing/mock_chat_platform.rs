//! Mock chat platform for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::delivery::{ChatPlatform, ChatTarget, DeliveryError, DeliveryMode, MessageHandle, Upload};

/// A recorded upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub target: ChatTarget,
    pub mode: DeliveryMode,
    pub upload: Upload,
    /// Bytes found at `upload.path` when the upload was made; `None` if the
    /// file did not exist.
    pub bytes_on_disk: Option<u64>,
}

/// Mock implementation of the ChatPlatform trait.
///
/// Records every message, edit and upload. Failures can be injected for the
/// next message, the next upload, or every edit.
#[derive(Debug)]
pub struct MockChatPlatform {
    messages: Arc<RwLock<Vec<String>>>,
    edits: Arc<RwLock<Vec<(MessageHandle, String)>>>,
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    next_message_error: Arc<RwLock<Option<DeliveryError>>>,
    next_upload_error: Arc<RwLock<Option<DeliveryError>>>,
    fail_edits: Arc<RwLock<bool>>,
    next_message_id: AtomicI64,
}

impl Default for MockChatPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChatPlatform {
    /// Create a new mock platform.
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
            edits: Arc::new(RwLock::new(Vec::new())),
            uploads: Arc::new(RwLock::new(Vec::new())),
            next_message_error: Arc::new(RwLock::new(None)),
            next_upload_error: Arc::new(RwLock::new(None)),
            fail_edits: Arc::new(RwLock::new(false)),
            next_message_id: AtomicI64::new(1),
        }
    }

    /// Texts of all sent messages, in order.
    pub async fn messages(&self) -> Vec<String> {
        self.messages.read().await.clone()
    }

    /// All successful edits, in order.
    pub async fn edits(&self) -> Vec<(MessageHandle, String)> {
        self.edits.read().await.clone()
    }

    /// All successful uploads, in order.
    pub async fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    /// Configure the next `send_message` to fail.
    pub async fn set_next_message_error(&self, error: DeliveryError) {
        *self.next_message_error.write().await = Some(error);
    }

    /// Configure the next upload to fail.
    pub async fn set_next_upload_error(&self, error: DeliveryError) {
        *self.next_upload_error.write().await = Some(error);
    }

    /// Make every edit fail like a rate-limited platform.
    pub async fn set_fail_edits(&self, fail: bool) {
        *self.fail_edits.write().await = fail;
    }

    fn handle(&self, target: &ChatTarget) -> MessageHandle {
        MessageHandle {
            chat_id: target.chat_id,
            message_id: self.next_message_id.fetch_add(1, Ordering::Relaxed),
        }
    }

    async fn record_upload(
        &self,
        target: &ChatTarget,
        mode: DeliveryMode,
        upload: Upload,
    ) -> Result<MessageHandle, DeliveryError> {
        if let Some(err) = self.next_upload_error.write().await.take() {
            return Err(err);
        }

        let bytes_on_disk = tokio::fs::metadata(&upload.path)
            .await
            .ok()
            .map(|meta| meta.len());

        self.uploads.write().await.push(RecordedUpload {
            target: *target,
            mode,
            upload,
            bytes_on_disk,
        });
        Ok(self.handle(target))
    }
}

#[async_trait]
impl ChatPlatform for MockChatPlatform {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send_message(
        &self,
        target: &ChatTarget,
        text: &str,
    ) -> Result<MessageHandle, DeliveryError> {
        if let Some(err) = self.next_message_error.write().await.take() {
            return Err(err);
        }
        self.messages.write().await.push(text.to_string());
        Ok(self.handle(target))
    }

    async fn edit_message(&self, handle: &MessageHandle, text: &str) -> Result<(), DeliveryError> {
        if *self.fail_edits.read().await {
            return Err(DeliveryError::Platform {
                code: 429,
                description: "Too Many Requests".to_string(),
            });
        }
        self.edits.write().await.push((*handle, text.to_string()));
        Ok(())
    }

    async fn send_video(
        &self,
        target: &ChatTarget,
        upload: Upload,
    ) -> Result<MessageHandle, DeliveryError> {
        self.record_upload(target, DeliveryMode::InlineVideo, upload)
            .await
    }

    async fn send_document(
        &self,
        target: &ChatTarget,
        upload: Upload,
    ) -> Result<MessageHandle, DeliveryError> {
        self.record_upload(target, DeliveryMode::Document, upload)
            .await
    }
}
