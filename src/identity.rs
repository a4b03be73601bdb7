//! Current authenticated user.

use std::sync::{Arc, RwLock};

/// Shared handle to the signed-in user of one context.
///
/// Cloning shares the same slot, so a sign-out is seen by every component
/// holding a clone.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    user_id: Arc<RwLock<Option<String>>>,
}

impl Identity {
    /// Anonymous identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Identity already signed in as `user_id`.
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        let identity = Self::default();
        identity.sign_in(user_id);
        identity
    }

    /// Sign in, replacing any previous user.
    pub fn sign_in(&self, user_id: impl Into<String>) {
        *self
            .user_id
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(user_id.into());
    }

    /// Sign out.
    pub fn sign_out(&self) {
        *self
            .user_id
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    /// The signed-in user, if any.
    pub fn user_id(&self) -> Option<String> {
        self.user_id
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Whether someone is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_sign_out() {
        let identity = Identity::signed_in("user-1");
        let clone = identity.clone();

        assert_eq!(clone.user_id().as_deref(), Some("user-1"));
        identity.sign_out();
        assert!(!clone.is_authenticated());
    }
}
