//! Static allow-list guard.
//!
//! The front end calls [`AllowList::authorize`] explicitly before handing a
//! request to the pipeline.

mod allow_list;

pub use allow_list::AllowList;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("User {user_id} is not allowed to use this bot")]
    NotAllowed { user_id: i64 },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}
