use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::{Session, SessionType};
use crate::background::BackgroundTasks;
use crate::identity::Identity;
use crate::metrics::MetricsAggregator;
use crate::storage::{ProgressRecord, Storage};
use crate::transport::{SessionAction, SessionEvent, TransportClient};

/// Active session and the user who started it.
#[derive(Debug)]
struct ActiveSlot {
    user_id: String,
    session: Session,
}

/// Owns the active-session slot of one user context.
///
/// State machine: Idle → Active (`start`) → Idle (`complete`). The slot
/// belongs to the user who started the session; after a sign-in switch it
/// reads as Idle and is dropped on the next operation. Checkpoint writes
/// happen while the slot is held, so a completion is never overwritten by an
/// older progress write.
///
/// Storage and transport failures are logged and never undo a transition.
/// Lifecycle events are delivered at-least-once and unordered: each is its
/// own background request with its own retries, so the remote orders them by
/// `timestamp`.
pub struct SessionTracker {
    storage: Arc<dyn Storage>,
    transport: TransportClient,
    identity: Identity,
    background: BackgroundTasks,
    metrics: Arc<MetricsAggregator>,
    inactivity_timeout: Option<Duration>,
    active: Mutex<Option<ActiveSlot>>,
}

impl SessionTracker {
    /// Create a tracker in the Idle state.
    pub fn new(
        storage: Arc<dyn Storage>,
        transport: TransportClient,
        identity: Identity,
        background: BackgroundTasks,
        metrics: Arc<MetricsAggregator>,
    ) -> Self {
        Self {
            storage,
            transport,
            identity,
            background,
            metrics,
            inactivity_timeout: None,
            active: Mutex::new(None),
        }
    }

    /// Drop an active session idle for longer than `timeout` on the next `start`.
    pub fn with_inactivity_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    /// Snapshot of the signed-in user's active session.
    pub async fn active(&self) -> Option<Session> {
        let user_id = self.identity.user_id()?;
        let slot = self.active.lock().await;
        slot.as_ref()
            .filter(|active| active.user_id == user_id)
            .map(|active| active.session.clone())
    }

    /// Start a session.
    ///
    /// Returns `None` without side effects when nobody is signed in or a
    /// session is already active.
    pub async fn start(
        &self,
        session_type: SessionType,
        metadata: Option<Map<String, Value>>,
    ) -> Option<String> {
        let Some(user_id) = self.identity.user_id() else {
            debug!(%session_type, "Session start rejected: not signed in");
            return None;
        };

        let session = {
            let mut slot = self.active.lock().await;

            if let Some(existing) = claim(&mut slot, &user_id) {
                if self.is_abandoned(existing, Utc::now()) {
                    warn!(
                        session_id = %existing.id,
                        last_activity = %existing.last_activity_at,
                        "Dropping abandoned session"
                    );
                    *slot = None;
                } else {
                    debug!(
                        active_session = %existing.id,
                        "Session start rejected: a session is already active"
                    );
                    return None;
                }
            }

            let session = Session::new(session_type, metadata);
            *slot = Some(ActiveSlot {
                user_id: user_id.clone(),
                session: session.clone(),
            });
            session
        };

        let mut event = SessionEvent::new(&user_id, &session.id, SessionAction::Start);
        event.session_type = Some(session.session_type.as_str().to_string());
        event.timestamp = session.started_at;
        event.metadata = session.metadata_payload();
        self.report(event);

        info!(
            user_id = %user_id,
            session_id = %session.id,
            session_type = %session.session_type,
            "Session started"
        );

        Some(session.id)
    }

    /// Record progress on the active session. No-op when Idle.
    ///
    /// Reaching 100 marks the checkpoint completed but leaves the session
    /// active until `complete` is called.
    pub async fn update_progress(
        &self,
        percentage: u32,
        metadata: Option<Map<String, Value>>,
    ) -> Option<Session> {
        let user_id = self.identity.user_id()?;
        let now = Utc::now();

        let mut slot = self.active.lock().await;
        let session = {
            let session = claim(&mut slot, &user_id)?;
            session.duration_ms = session.elapsed_ms(now);
            session.last_activity_at = now;
            if let Some(metadata) = metadata.clone() {
                session.merge_metadata(metadata);
            }
            session.clone()
        };

        let completed = percentage >= 100;
        let mut record = ProgressRecord::new(&user_id, &session.id, percentage, completed)
            .with_category(session.session_type.as_str());
        if completed {
            record = record.with_completed_at(now);
        }

        // Still holding the slot: `complete` writes after this does.
        if let Err(e) = self.storage.upsert_progress(&record).await {
            error!(
                session_id = %session.id,
                percentage,
                error = %e,
                "Failed to persist session progress"
            );
        }
        drop(slot);

        let mut event = SessionEvent::new(&user_id, &session.id, SessionAction::Progress);
        event.progress = Some(record.percentage);
        event.timestamp = now;
        event.metadata = metadata;
        self.report(event);

        debug!(session_id = %session.id, percentage, "Session progress updated");

        Some(session)
    }

    /// Complete the active session and return it. No-op when Idle.
    pub async fn complete(&self, rating: Option<u8>) -> Option<Session> {
        let user_id = self.identity.user_id()?;
        let now = Utc::now();

        let mut slot = self.active.lock().await;
        claim(&mut slot, &user_id)?;
        let mut session = slot.take()?.session;
        session.completed = true;
        session.completed_at = Some(now);
        session.duration_ms = session.elapsed_ms(now);
        session.last_activity_at = now;

        let record = ProgressRecord::new(&user_id, &session.id, 100, true)
            .with_category(session.session_type.as_str())
            .with_completed_at(now);

        if let Err(e) = self.storage.upsert_progress(&record).await {
            error!(
                session_id = %session.id,
                error = %e,
                "Failed to persist session completion"
            );
        }
        drop(slot);

        let mut event = SessionEvent::new(&user_id, &session.id, SessionAction::Complete);
        event.session_type = Some(session.session_type.as_str().to_string());
        event.duration = Some(session.duration_ms);
        event.rating = rating;
        event.timestamp = now;
        event.metadata = session.metadata_payload();
        self.report(event);

        if let Err(e) = self.metrics.refresh().await {
            warn!(error = %e, "Failed to refresh progress snapshot");
        }

        info!(
            user_id = %user_id,
            session_id = %session.id,
            duration_ms = session.duration_ms,
            "Session completed"
        );

        Some(session)
    }

    fn is_abandoned(&self, session: &Session, now: DateTime<Utc>) -> bool {
        match self.inactivity_timeout {
            Some(timeout) => {
                let idle = now.signed_duration_since(session.last_activity_at);
                idle.to_std().map(|idle| idle > timeout).unwrap_or(false)
            }
            None => false,
        }
    }

    fn report(&self, event: SessionEvent) {
        let transport = self.transport.clone();
        let label = format!("track_session:{}", action_label(event.action));
        self.background
            .spawn(label, async move { transport.track_session(&event).await });
    }
}

/// The slot's session if `user_id` started it. A session left by another
/// user is dropped.
fn claim<'a>(slot: &'a mut Option<ActiveSlot>, user_id: &str) -> Option<&'a mut Session> {
    if let Some(active) = slot.as_ref() {
        if active.user_id != user_id {
            warn!(
                session_id = %active.session.id,
                owner = %active.user_id,
                user_id = %user_id,
                "Dropping session owned by another user"
            );
            *slot = None;
            return None;
        }
    }
    slot.as_mut().map(|active| &mut active.session)
}

fn action_label(action: SessionAction) -> &'static str {
    match action {
        SessionAction::Start => "start",
        SessionAction::Progress => "progress",
        SessionAction::Complete => "complete",
    }
}
