//! Per-user wiring of the tracking components.

use std::sync::Arc;

use tracing::{info, warn};

use crate::background::{BackgroundTasks, TaskOutcome};
use crate::config::{Config, TrackingConfig};
use crate::error::AppResult;
use crate::identity::Identity;
use crate::metrics::{MetricsAggregator, ProgressSnapshot};
use crate::preferences::{PreferenceSynchronizer, Preferences};
use crate::storage::{SqliteStorage, Storage};
use crate::tracking::{InteractionRecorder, SessionTracker};
use crate::transport::TransportClient;

/// Everything one signed-in user context needs.
///
/// Owns the only [`SessionTracker`] for the context, so the active-session
/// slot is never shared across users.
pub struct UserContext {
    /// Signed-in user.
    pub identity: Identity,
    /// Session lifecycle.
    pub sessions: SessionTracker,
    /// Interaction reporting.
    pub interactions: InteractionRecorder,
    /// Preference state.
    pub preferences: PreferenceSynchronizer,
    /// Progress statistics.
    pub metrics: Arc<MetricsAggregator>,
    /// Fire-and-forget work started by the components above.
    pub background: BackgroundTasks,
    transport: TransportClient,
}

impl UserContext {
    /// Wire a context from its collaborators.
    pub fn new(
        config: &TrackingConfig,
        storage: Arc<dyn Storage>,
        transport: TransportClient,
        identity: Identity,
    ) -> Self {
        let background = BackgroundTasks::new();
        let metrics = Arc::new(MetricsAggregator::new(
            Arc::clone(&storage),
            identity.clone(),
        ));

        let sessions = SessionTracker::new(
            Arc::clone(&storage),
            transport.clone(),
            identity.clone(),
            background.clone(),
            Arc::clone(&metrics),
        )
        .with_inactivity_timeout(config.session_inactivity_timeout);

        let interactions =
            InteractionRecorder::new(transport.clone(), identity.clone(), background.clone());

        let preferences = PreferenceSynchronizer::new(
            storage,
            transport.clone(),
            identity.clone(),
            background.clone(),
        );

        Self {
            identity,
            sessions,
            interactions,
            preferences,
            metrics,
            background,
            transport,
        }
    }

    /// Build a context backed by the configured SQLite database and API.
    pub async fn from_config(config: &Config, identity: Identity) -> AppResult<Self> {
        let storage = SqliteStorage::new(&config.database).await?;
        info!(path = %config.database.path.display(), "Database initialized");

        let transport = TransportClient::new(&config.api, config.request.clone())?;
        info!(base_url = %config.api.base_url, "Transport client initialized");

        Ok(Self::new(
            &config.tracking,
            Arc::new(storage),
            transport,
            identity,
        ))
    }

    /// Load preferences and compute the first snapshot.
    pub async fn mount(&self) -> (Preferences, Option<ProgressSnapshot>) {
        let preferences = self.preferences.load().await;
        let snapshot = match self.metrics.refresh().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Failed to compute progress snapshot");
                None
            }
        };
        (preferences, snapshot)
    }

    /// The transport shared by every component.
    pub fn transport(&self) -> &TransportClient {
        &self.transport
    }

    /// Wait for background work to finish.
    pub async fn shutdown(&self) -> Vec<TaskOutcome> {
        let outcomes = self.background.flush().await;
        info!(tasks = outcomes.len(), "Background work drained");
        outcomes
    }
}
