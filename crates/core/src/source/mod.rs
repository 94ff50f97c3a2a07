//! Source resolution: turning a user-supplied URL into a fetch plan.
//!
//! Direct links are fetched as-is. Links to the storage provider (Google
//! Drive by default) are turned into a two-phase plan against the provider's
//! export endpoint, because fetching the share page directly would download
//! the provider's HTML interstitial rather than the file.
//!
//! # Example
//!
//! ```ignore
//! use uplink_core::source::SourceResolver;
//!
//! let resolver = SourceResolver::with_defaults()?;
//! let plan = resolver.resolve("https://drive.google.com/file/d/abc123/view")?;
//! assert!(plan.is_two_phase());
//! assert_eq!(plan.provider_file_id(), Some("abc123"));
//! ```

mod error;
mod resolver;
mod types;

pub use error::SourceError;
pub use resolver::{sanitize_file_name, suggested_file_name, SourceResolver, FALLBACK_FILE_NAME};
pub use types::FetchPlan;
