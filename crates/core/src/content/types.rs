//! Types for content classification.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Coarse content category used for delivery decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MimeCategory {
    Video,
    Other,
}

impl MimeCategory {
    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video)
    }
}

/// Result of classifying a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: MimeCategory,
    /// True for videos not already in the canonical delivery container.
    pub needs_normalization: bool,
}

/// A file in the run workspace that is headed for delivery.
///
/// Exactly one file backs an artifact at a time; replacing it (after a
/// transcode) removes the previous file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    /// Name shown to the recipient.
    pub declared_name: String,
    pub size_bytes: u64,
    pub category: MimeCategory,
}
