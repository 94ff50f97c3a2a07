//! Streaming HTTP downloader.
//!
//! Executes a [`FetchPlan`](crate::source::FetchPlan) into a local file:
//!
//! - Direct plans stream the endpoint's body.
//! - Two-phase plans query the provider export endpoint, pick up the
//!   large-file confirmation cookie if one is set, and repeat the request
//!   with `confirm=<token>` to obtain the real payload.
//!
//! Bytes are written to disk chunk by chunk and never buffered whole.
//! Progress is reported through a bounded channel, throttled to one event
//! every N chunks plus a final event on completion. A full or closed
//! progress channel never aborts the download.
//!
//! # Example
//!
//! ```ignore
//! use uplink_core::downloader::HttpDownloader;
//!
//! let downloader = HttpDownloader::with_defaults()?;
//! let (tx, mut rx) = tokio::sync::mpsc::channel(16);
//! let result = downloader
//!     .download(&plan, Path::new("/tmp/ws/file.bin"), Some(&tx), &CancellationToken::new())
//!     .await?;
//! println!("{} bytes", result.bytes_written);
//! ```

mod error;
mod http;
mod types;

pub use error::DownloadError;
pub use http::{content_disposition_filename, HttpDownloader};
pub use types::{DownloadResult, DownloadSession, ProgressEvent};
