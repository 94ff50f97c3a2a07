//! Per-user upload preferences.
//!
//! The chat front end owns a [`PreferenceStore`] and turns it into a
//! [`JobPreferences`] value for each run. A pending rename is consumed by the
//! first job that takes it; a thumbnail stays until cleared.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

/// Chat user identifier.
pub type UserId = i64;

/// Stored preferences for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub rename: Option<String>,
    pub thumbnail: Option<PathBuf>,
}

/// Preferences applied to a single pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPreferences {
    /// Alternate file name for the delivered artifact.
    pub rename: Option<String>,
    /// Thumbnail for document uploads; ignored if missing at delivery time.
    pub thumbnail: Option<PathBuf>,
}

/// In-memory preference mapping keyed by user.
#[derive(Debug, Default)]
pub struct PreferenceStore {
    users: RwLock<HashMap<UserId, UserPreferences>>,
}

impl PreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name the next upload of `user` is delivered under.
    pub async fn set_rename(&self, user: UserId, name: impl Into<String>) {
        let name = name.into().trim().to_string();
        let mut users = self.users.write().await;
        let prefs = users.entry(user).or_default();
        prefs.rename = if name.is_empty() { None } else { Some(name) };
    }

    pub async fn set_thumbnail(&self, user: UserId, path: impl Into<PathBuf>) {
        let mut users = self.users.write().await;
        users.entry(user).or_default().thumbnail = Some(path.into());
    }

    /// Drops all preferences of `user`.
    pub async fn clear(&self, user: UserId) {
        self.users.write().await.remove(&user);
    }

    pub async fn get(&self, user: UserId) -> UserPreferences {
        self.users
            .read()
            .await
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }

    /// Preferences for a new job. The rename is removed from the store.
    pub async fn take_for_job(&self, user: UserId) -> JobPreferences {
        let mut users = self.users.write().await;
        let Some(prefs) = users.get_mut(&user) else {
            return JobPreferences::default();
        };

        let rename = prefs.rename.take();
        if rename.is_some() {
            debug!(user, "Consumed pending rename");
        }

        JobPreferences {
            rename,
            thumbnail: prefs.thumbnail.clone(),
        }
    }
}
