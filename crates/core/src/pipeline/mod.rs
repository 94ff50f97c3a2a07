//! Download, normalize and deliver pipeline.
//!
//! One run takes a source URL and a chat target through
//! `Resolving → Downloading → Classifying → (Normalizing) → Delivering →
//! Cleanup → Done | Failed`:
//!
//! 1. The URL is resolved into a fetch plan. Invalid or unresolvable links
//!    fail here, before any workspace or network transfer exists.
//! 2. The payload is streamed into a fresh per-run [`Workspace`].
//! 3. The file takes its final name (user rename, server-announced name or
//!    URL name) and is classified by extension.
//! 4. Videos outside the canonical container are transcoded to mp4. A failed
//!    transcode is reported as a warning and the original is delivered.
//! 5. The artifact is uploaded inline or as a document.
//! 6. The workspace is removed, then [`StatusEvent::Finished`] is sent.
//!
//! Nothing is retried. Cancellation through a `CancellationToken` aborts the
//! current step and still runs cleanup.
//!
//! # Example
//!
//! ```ignore
//! use uplink_core::pipeline::{PipelineOrchestrator, PipelineRequest};
//!
//! let orchestrator = PipelineOrchestrator::from_config(&config, transcoder, platform)?;
//! let (tx, rx) = tokio::sync::mpsc::channel(64);
//! let request = PipelineRequest::new("https://example.com/clip.avi", ChatTarget::new(chat_id));
//! let report = orchestrator.run(request, tx, CancellationToken::new()).await;
//! ```

mod error;
mod orchestrator;
mod types;
mod workspace;

pub use error::PipelineError;
pub use orchestrator::{PipelineOrchestrator, PipelineSettings};
pub use types::{DeliveryOutcome, PipelineReport, PipelineRequest, PipelineStage, StatusEvent};
pub use workspace::Workspace;
