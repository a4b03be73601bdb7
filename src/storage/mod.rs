//! Storage layer for progress checkpoints and preferences.
//!
//! The [`Storage`] trait is the record-store collaborator the tracking core
//! talks to. [`SqliteStorage`] is the bundled implementation.

mod sqlite;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::preferences::{Preferences, PreferencesPatch};

/// Persisted progress checkpoint, keyed by `(user_id, session_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Owner of the session.
    pub user_id: String,
    /// Session the checkpoint belongs to.
    pub session_id: String,
    /// Progress percentage (0-100).
    pub percentage: u32,
    /// Whether the session finished.
    pub completed: bool,
    /// When the session finished.
    pub completed_at: Option<DateTime<Utc>>,
    /// Session type name, used for the favorite-category statistic.
    pub category: Option<String>,
    /// When the checkpoint was last written.
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Create a checkpoint. Percentage is clamped to 100.
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        percentage: u32,
        completed: bool,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            percentage: percentage.min(100),
            completed,
            completed_at: None,
            category: None,
            updated_at: Utc::now(),
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the completion time.
    pub fn with_completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }
}

/// Storage trait for the record store.
///
/// Writes are keyed upserts and safe to repeat.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert or update the checkpoint for `(user_id, session_id)`.
    async fn upsert_progress(&self, record: &ProgressRecord) -> StorageResult<()>;
    /// Get one checkpoint.
    async fn get_progress(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> StorageResult<Option<ProgressRecord>>;
    /// All completed checkpoints of a user, oldest completion first.
    async fn list_completed_sessions(&self, user_id: &str) -> StorageResult<Vec<ProgressRecord>>;

    /// Stored preferences of a user. Fields never written come back as `None`.
    async fn get_preferences(&self, user_id: &str) -> StorageResult<Option<PreferencesPatch>>;
    /// Insert or replace the preferences of a user.
    async fn upsert_preferences(&self, user_id: &str, preferences: &Preferences)
        -> StorageResult<()>;
}
