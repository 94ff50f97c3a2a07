//! Delivery of finished artifacts to a chat platform.
//!
//! This module provides:
//!
//! - [`ChatPlatform`], the outbound surface the pipeline needs (text
//!   messages, edits, video and document uploads).
//! - [`TelegramClient`], the Bot API implementation over multipart HTTP. It
//!   also long-polls [`Update`]s for the bot front end.
//! - [`DeliveryDispatcher`], which picks the delivery mode and uploads.
//! - [`StatusRelay`], which mirrors pipeline status events as chat messages.
//!
//! Mode selection: an artifact goes out as an inline video only when it is a
//! video and strictly smaller than `inline_video_max_bytes` (50 MiB by
//! default). Everything else is sent as a document, which is also the only
//! mode that carries a thumbnail.

mod dispatcher;
mod error;
mod status;
mod telegram;
mod traits;
mod types;
mod updates;

pub use dispatcher::{select_mode, DeliveryDispatcher};
pub use error::DeliveryError;
pub use status::{
    format_duration, format_size, progress_bar, render_event, render_progress, RelayStats,
    StatusRelay,
};
pub use telegram::TelegramClient;
pub use traits::ChatPlatform;
pub use types::{ChatTarget, DeliveryMode, DeliveryReceipt, MessageHandle, Upload};
pub use updates::{Chat, IncomingMessage, PhotoSize, Sender, Update};
