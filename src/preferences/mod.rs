//! User preference loading, merging and persistence.

mod types;

pub use types::{
    NotificationSettings, NotificationSettingsPatch, Preferences, PreferencesPatch, SyncStatus,
    DEFAULT_PREFERRED_DURATION,
};

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::background::BackgroundTasks;
use crate::identity::Identity;
use crate::storage::Storage;
use crate::transport::TransportClient;

struct PreferenceState {
    preferences: Preferences,
    status: SyncStatus,
}

/// Keeps the in-memory preferences of a user context in step with storage.
///
/// Updates are visible immediately; [`SyncStatus`] reports whether storage
/// has acknowledged them. A failed write keeps the local value and is
/// reported as [`SyncStatus::Failed`].
pub struct PreferenceSynchronizer {
    storage: Arc<dyn Storage>,
    transport: TransportClient,
    identity: Identity,
    background: BackgroundTasks,
    state: RwLock<PreferenceState>,
}

impl PreferenceSynchronizer {
    /// Create a synchronizer holding defaults.
    pub fn new(
        storage: Arc<dyn Storage>,
        transport: TransportClient,
        identity: Identity,
        background: BackgroundTasks,
    ) -> Self {
        Self {
            storage,
            transport,
            identity,
            background,
            state: RwLock::new(PreferenceState {
                preferences: Preferences::default(),
                status: SyncStatus::NotLoaded,
            }),
        }
    }

    /// Current in-memory preferences.
    pub async fn current(&self) -> Preferences {
        self.state.read().await.preferences.clone()
    }

    /// Sync status of the current preferences.
    pub async fn status(&self) -> SyncStatus {
        self.state.read().await.status.clone()
    }

    /// Load from storage, backfilling anything missing from defaults.
    ///
    /// On a storage error the current value is kept and returned.
    pub async fn load(&self) -> Preferences {
        let Some(user_id) = self.identity.user_id() else {
            return self.current().await;
        };

        match self.storage.get_preferences(&user_id).await {
            Ok(stored) => {
                let preferences = stored
                    .as_ref()
                    .map(Preferences::from_partial)
                    .unwrap_or_default();
                debug!(user_id = %user_id, found = stored.is_some(), "Preferences loaded");

                let mut state = self.state.write().await;
                state.preferences = preferences.clone();
                state.status = SyncStatus::Synced;
                preferences
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to load preferences");
                let mut state = self.state.write().await;
                state.status = SyncStatus::Failed {
                    error: e.to_string(),
                };
                state.preferences.clone()
            }
        }
    }

    /// Merge `patch` into the current preferences and persist the result.
    ///
    /// Returns the merged preferences, or `None` when nobody is signed in.
    pub async fn update(&self, patch: PreferencesPatch) -> Option<Preferences> {
        let user_id = self.identity.user_id()?;

        let merged = {
            let mut state = self.state.write().await;
            let merged = state.preferences.merge(&patch);
            state.preferences = merged.clone();
            state.status = SyncStatus::Pending;
            merged
        };

        self.persist(&user_id, &merged).await;
        Some(merged)
    }

    /// Replace the preferences with defaults and persist them.
    pub async fn reset(&self) -> Option<Preferences> {
        let user_id = self.identity.user_id()?;
        let defaults = Preferences::default();

        {
            let mut state = self.state.write().await;
            state.preferences = defaults.clone();
            state.status = SyncStatus::Pending;
        }

        self.persist(&user_id, &defaults).await;
        Some(defaults)
    }

    async fn persist(&self, user_id: &str, preferences: &Preferences) {
        let result = self.storage.upsert_preferences(user_id, preferences).await;

        {
            let mut state = self.state.write().await;
            // A newer update owns the status now.
            if state.preferences != *preferences {
                return;
            }
            state.status = match &result {
                Ok(()) => SyncStatus::Synced,
                Err(e) => SyncStatus::Failed {
                    error: e.to_string(),
                },
            };
        }

        match result {
            Ok(()) => {
                info!(user_id = %user_id, "Preferences saved");
                let transport = self.transport.clone();
                let user_id = user_id.to_string();
                let remote = preferences.clone();
                self.background.spawn("update_user_preferences", async move {
                    transport.update_user_preferences(&user_id, &remote).await
                });
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to save preferences");
            }
        }
    }
}
