//! Chat platform trait definition.

use async_trait::async_trait;

use super::error::DeliveryError;
use super::types::{ChatTarget, MessageHandle, Upload};

/// Outbound operations the pipeline needs from a chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Returns the name of this platform.
    fn name(&self) -> &str;

    /// Sends a plain text message.
    async fn send_message(
        &self,
        target: &ChatTarget,
        text: &str,
    ) -> Result<MessageHandle, DeliveryError>;

    /// Replaces the text of a previously sent message.
    async fn edit_message(&self, handle: &MessageHandle, text: &str) -> Result<(), DeliveryError>;

    /// Uploads a file as an inline, streamable video.
    async fn send_video(
        &self,
        target: &ChatTarget,
        upload: Upload,
    ) -> Result<MessageHandle, DeliveryError>;

    /// Uploads a file as a generic document.
    async fn send_document(
        &self,
        target: &ChatTarget,
        upload: Upload,
    ) -> Result<MessageHandle, DeliveryError>;
}
