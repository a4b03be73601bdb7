use chrono::Utc;
use serde_json::{Map, Value};
use tracing::debug;

use crate::background::BackgroundTasks;
use crate::identity::Identity;
use crate::transport::{InteractionEvent, TransportClient};

/// Fire-and-forget reporter for discrete interactions.
#[derive(Clone)]
pub struct InteractionRecorder {
    transport: TransportClient,
    identity: Identity,
    background: BackgroundTasks,
}

impl InteractionRecorder {
    /// Create a recorder that reports through `transport`.
    pub fn new(transport: TransportClient, identity: Identity, background: BackgroundTasks) -> Self {
        Self {
            transport,
            identity,
            background,
        }
    }

    /// Report `action` on `target`. Returns immediately; failures are only logged.
    pub fn record(
        &self,
        action: impl Into<String>,
        target: impl Into<String>,
        metadata: Option<Map<String, Value>>,
    ) {
        let Some(user_id) = self.identity.user_id() else {
            debug!("Interaction dropped: not signed in");
            return;
        };

        let event = InteractionEvent {
            user_id,
            action: action.into(),
            target: target.into(),
            timestamp: Utc::now(),
            metadata,
        };
        let label = format!("track_interaction:{}", event.action);
        let transport = self.transport.clone();

        self.background
            .spawn(label, async move { transport.track_interaction(&event).await });
    }

    /// Report a like.
    pub fn like(&self, target: impl Into<String>) {
        self.record("like", target, None);
    }

    /// Report a save.
    pub fn save(&self, target: impl Into<String>) {
        self.record("save", target, None);
    }

    /// Report a share.
    pub fn share(&self, target: impl Into<String>) {
        self.record("share", target, None);
    }

    /// Report a view.
    pub fn view(&self, target: impl Into<String>) {
        self.record("view", target, None);
    }
}
