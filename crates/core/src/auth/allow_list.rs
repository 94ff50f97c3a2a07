//! Allow-list of chat users.

use std::collections::HashSet;

use tracing::warn;

use crate::config::AuthConfig;
use crate::preferences::UserId;

use super::AuthError;

/// Users permitted to trigger uploads.
#[derive(Debug, Clone)]
pub struct AllowList {
    users: HashSet<UserId>,
}

impl AllowList {
    pub fn new(users: impl IntoIterator<Item = UserId>) -> Result<Self, AuthError> {
        let users: HashSet<UserId> = users.into_iter().collect();
        if users.is_empty() {
            return Err(AuthError::ConfigurationError(
                "allowed_user_ids must not be empty".to_string(),
            ));
        }
        Ok(Self { users })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        Self::new(config.allowed_user_ids.iter().copied())
    }

    pub fn is_allowed(&self, user_id: UserId) -> bool {
        self.users.contains(&user_id)
    }

    /// Fails with [`AuthError::NotAllowed`] for users outside the list.
    pub fn authorize(&self, user_id: UserId) -> Result<(), AuthError> {
        if self.is_allowed(user_id) {
            Ok(())
        } else {
            warn!(user_id, "Rejected request from user outside the allow-list");
            Err(AuthError::NotAllowed { user_id })
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize() {
        let list = AllowList::from_config(&AuthConfig {
            allowed_user_ids: vec![1001, 1002],
        })
        .unwrap();

        tokio_test::assert_ok!(list.authorize(1001));
        assert_eq!(
            list.authorize(42),
            Err(AuthError::NotAllowed { user_id: 42 })
        );
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_duplicates_collapse() {
        let list = AllowList::new([7, 7, 7]).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_empty_list_is_rejected() {
        let err = tokio_test::assert_err!(AllowList::new(Vec::new()));
        assert!(matches!(err, AuthError::ConfigurationError(_)));
    }
}
