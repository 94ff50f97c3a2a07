//! Types for the delivery module.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Opaque chat handle uploads and status messages are sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatTarget {
    pub chat_id: i64,
}

impl ChatTarget {
    pub fn new(chat_id: i64) -> Self {
        Self { chat_id }
    }
}

impl fmt::Display for ChatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.chat_id)
    }
}

/// A message previously sent by the platform, used for edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHandle {
    pub chat_id: i64,
    pub message_id: i64,
}

/// How an artifact is presented in the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Platform-native video with inline preview.
    InlineVideo,
    /// Generic file attachment.
    Document,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InlineVideo => "video",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub path: PathBuf,
    /// Name the recipient sees.
    pub file_name: String,
    pub size_bytes: u64,
    pub caption: Option<String>,
    /// Only honoured for document uploads.
    pub thumbnail: Option<PathBuf>,
    pub disable_notification: bool,
}

/// Proof of a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryReceipt {
    pub mode: DeliveryMode,
    pub message: MessageHandle,
    pub file_name: String,
    pub size_bytes: u64,
    pub thumbnail_attached: bool,
}
