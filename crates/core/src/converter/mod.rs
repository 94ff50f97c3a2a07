//! Converter module for normalizing videos before delivery.
//!
//! This module provides the `Transcoder` trait and an FFmpeg-backed
//! implementation that re-encodes any video into a streaming-friendly mp4
//! (H.264 video, AAC audio, `+faststart`).
//!
//! A failed transcode is recoverable: the caller keeps the original file and
//! delivers it unconverted.
//!
//! # Example
//!
//! ```ignore
//! use uplink_core::converter::{FfmpegTranscoder, Transcoder, TranscodeJob};
//!
//! let transcoder = FfmpegTranscoder::with_defaults();
//! transcoder.validate().await?;
//!
//! let job = TranscodeJob::new("run-1", "/tmp/ws/clip.avi", "/tmp/ws/clip.mp4");
//! let result = transcoder.transcode(job, &CancellationToken::new()).await?;
//! println!("Converted in {} ms", result.duration_ms);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::Transcoder;
pub use types::{TranscodeJob, TranscodeResult};
