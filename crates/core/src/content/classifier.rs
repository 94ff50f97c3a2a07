//! Extension-based classifier.

use std::path::Path;

use super::types::{Classification, MimeCategory};

/// Extensions treated as video when no configuration overrides them.
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "flv", "wmv", "webm"];

/// Container every video is normalized to before delivery.
pub const CANONICAL_VIDEO_EXTENSION: &str = "mp4";

/// Classifies `name` against `video_extensions` (compared case-insensitively).
pub fn classify<S: AsRef<str>>(name: &str, video_extensions: &[S]) -> Classification {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let Some(extension) = extension else {
        return Classification {
            category: MimeCategory::Other,
            needs_normalization: false,
        };
    };

    let is_video = video_extensions
        .iter()
        .any(|v| v.as_ref().trim_start_matches('.').eq_ignore_ascii_case(&extension));

    if is_video {
        Classification {
            category: MimeCategory::Video,
            needs_normalization: extension != CANONICAL_VIDEO_EXTENSION,
        }
    } else {
        Classification {
            category: MimeCategory::Other,
            needs_normalization: false,
        }
    }
}

/// Classifies `name` against [`DEFAULT_VIDEO_EXTENSIONS`].
pub fn classify_default(name: &str) -> Classification {
    classify(name, DEFAULT_VIDEO_EXTENSIONS)
}
