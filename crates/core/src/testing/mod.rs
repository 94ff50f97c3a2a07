//! Testing utilities and mock implementations.
//!
//! These mocks stand in for the external tool and the chat platform so the
//! whole pipeline can run in tests against a local HTTP server.
//!
//! # Example
//!
//! ```rust,ignore
//! use uplink_core::testing::{MockChatPlatform, MockTranscoder};
//!
//! let platform = Arc::new(MockChatPlatform::new());
//! let transcoder = Arc::new(MockTranscoder::new());
//!
//! // ... run a pipeline ...
//!
//! assert_eq!(platform.uploads().await.len(), 1);
//! assert_eq!(transcoder.transcode_count().await, 1);
//! ```

mod mock_chat_platform;
mod mock_transcoder;

pub use mock_chat_platform::{MockChatPlatform, RecordedUpload};
pub use mock_transcoder::{MockTranscoder, RecordedTranscode};
