//! Session lifecycle and interaction tracking.
//!
//! [`SessionTracker`] owns the single active session of a user context.
//! [`InteractionRecorder`] reports likes, saves, shares and views without
//! ever holding up the caller.

mod interaction;
mod session;

pub use interaction::InteractionRecorder;
pub use session::SessionTracker;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Kind of guided session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    /// Guided meditation.
    Meditation,
    /// Mindful movement.
    Exercise,
    /// Breathing exercise.
    Breathing,
    /// Reading.
    Reading,
}

impl SessionType {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Meditation => "meditation",
            SessionType::Exercise => "exercise",
            SessionType::Breathing => "breathing",
            SessionType::Reading => "reading",
        }
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "meditation" => Ok(SessionType::Meditation),
            "exercise" => Ok(SessionType::Exercise),
            "breathing" => Ok(SessionType::Breathing),
            "reading" => Ok(SessionType::Reading),
            _ => Err(format!("Unknown session type: {}", s)),
        }
    }
}

/// An in-progress or finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: String,
    /// Kind of session.
    pub session_type: SessionType,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// When the session was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Elapsed time since start, in milliseconds, as of the last update.
    pub duration_ms: u64,
    /// Whether `complete` has been called.
    pub completed: bool,
    /// Free-form metadata merged across updates.
    pub metadata: Map<String, Value>,
    /// Last start/update/complete call.
    pub last_activity_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session starting now.
    pub fn new(session_type: SessionType, metadata: Option<Map<String, Value>>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            session_type,
            started_at: now,
            completed_at: None,
            duration_ms: 0,
            completed: false,
            metadata: metadata.unwrap_or_default(),
            last_activity_at: now,
        }
    }

    /// Milliseconds between start and `now`, zero if the clock went back.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        now.signed_duration_since(self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }

    /// Shallow-merge `metadata` into the session's map.
    pub fn merge_metadata(&mut self, metadata: Map<String, Value>) {
        self.metadata.extend(metadata);
    }

    /// Metadata as an event payload; `None` when empty.
    pub(crate) fn metadata_payload(&self) -> Option<Map<String, Value>> {
        if self.metadata.is_empty() {
            None
        } else {
            Some(self.metadata.clone())
        }
    }
}
