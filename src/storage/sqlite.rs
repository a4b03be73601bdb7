use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use super::{ProgressRecord, Storage};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};
use crate::preferences::{NotificationSettingsPatch, Preferences, PreferencesPatch};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Create a private in-memory database (single connection, kept alive).
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            }
        })?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn upsert_progress(&self, record: &ProgressRecord) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO session_progress
                (user_id, session_id, percentage, completed, completed_at, category, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, session_id) DO UPDATE SET
                percentage = excluded.percentage,
                completed = excluded.completed,
                completed_at = COALESCE(excluded.completed_at, session_progress.completed_at),
                category = COALESCE(excluded.category, session_progress.category),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.user_id)
        .bind(&record.session_id)
        .bind(i64::from(record.percentage.min(100)))
        .bind(record.completed)
        .bind(record.completed_at.map(|t| t.to_rfc3339()))
        .bind(&record.category)
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_progress(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> StorageResult<Option<ProgressRecord>> {
        let row: Option<ProgressRow> = sqlx::query_as(
            r#"
            SELECT user_id, session_id, percentage, completed, completed_at, category, updated_at
            FROM session_progress
            WHERE user_id = ? AND session_id = ?
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_completed_sessions(&self, user_id: &str) -> StorageResult<Vec<ProgressRecord>> {
        let rows: Vec<ProgressRow> = sqlx::query_as(
            r#"
            SELECT user_id, session_id, percentage, completed, completed_at, category, updated_at
            FROM session_progress
            WHERE user_id = ? AND completed = 1
            ORDER BY completed_at ASC, updated_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn get_preferences(&self, user_id: &str) -> StorageResult<Option<PreferencesPatch>> {
        let row: Option<PreferencesRow> = sqlx::query_as(
            r#"
            SELECT preferred_duration, preferred_categories, notification_settings,
                   personality_type, goals
            FROM user_preferences
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn upsert_preferences(
        &self,
        user_id: &str,
        preferences: &Preferences,
    ) -> StorageResult<()> {
        let categories = serde_json::to_string(&preferences.preferred_categories)?;
        let notifications = serde_json::to_string(&preferences.notification_settings)?;
        let goals = preferences
            .goals
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO user_preferences
                (user_id, preferred_duration, preferred_categories, notification_settings,
                 personality_type, goals, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                preferred_duration = excluded.preferred_duration,
                preferred_categories = excluded.preferred_categories,
                notification_settings = excluded.notification_settings,
                personality_type = excluded.personality_type,
                goals = excluded.goals,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(i64::from(preferences.preferred_duration))
        .bind(&categories)
        .bind(&notifications)
        .bind(&preferences.personality_type)
        .bind(&goals)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// Internal row types for SQLx mapping
#[derive(sqlx::FromRow)]
struct ProgressRow {
    user_id: String,
    session_id: String,
    percentage: i64,
    completed: bool,
    completed_at: Option<String>,
    category: Option<String>,
    updated_at: String,
}

impl From<ProgressRow> for ProgressRecord {
    fn from(row: ProgressRow) -> Self {
        Self {
            user_id: row.user_id,
            session_id: row.session_id,
            percentage: row.percentage.clamp(0, 100) as u32,
            completed: row.completed,
            completed_at: row.completed_at.as_deref().and_then(parse_timestamp),
            category: row.category,
            updated_at: parse_timestamp(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

#[derive(sqlx::FromRow)]
struct PreferencesRow {
    preferred_duration: Option<i64>,
    preferred_categories: Option<String>,
    notification_settings: Option<String>,
    personality_type: Option<String>,
    goals: Option<String>,
}

impl From<PreferencesRow> for PreferencesPatch {
    fn from(row: PreferencesRow) -> Self {
        Self {
            preferred_duration: row
                .preferred_duration
                .and_then(|d| u32::try_from(d).ok()),
            preferred_categories: row
                .preferred_categories
                .and_then(|s| serde_json::from_str(&s).ok()),
            notification_settings: row
                .notification_settings
                .and_then(|s| serde_json::from_str::<NotificationSettingsPatch>(&s).ok()),
            personality_type: row.personality_type,
            goals: row.goals.and_then(|s| serde_json::from_str(&s).ok()),
        }
    }
}
