//! Content classification by file name.
//!
//! Decides whether a downloaded artifact is a video and whether it must be
//! normalized to the canonical delivery container (mp4) before upload.
//! Classification is extension-based and case-insensitive; it never touches
//! the file itself.

mod classifier;
mod types;

pub use classifier::{classify, classify_default, CANONICAL_VIDEO_EXTENSION, DEFAULT_VIDEO_EXTENSIONS};
pub use types::{Artifact, Classification, MimeCategory};
