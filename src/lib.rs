//! # Mindful Tracking
//!
//! Engagement tracking core for a mindfulness and dream-journaling app: the
//! client-side coordination between user-triggered events and the remote
//! persistence/analytics boundary.
//!
//! ## Features
//!
//! - **Resilient transport**: per-attempt timeout, bounded retries with
//!   exponential backoff, one observability record per attempt
//! - **Session lifecycle**: a single active session per user context,
//!   start → progress → complete
//! - **Progress metrics**: totals, streaks, achievements and favorite
//!   category recomputed from the stored checkpoints
//! - **Preference sync**: per-field merge, keyed upsert, explicit sync status
//! - **Interaction tracking**: fire-and-forget like/save/share/view events
//!
//! ## Architecture
//!
//! ```text
//! caller → SessionTracker ─┬→ Storage (SQLite checkpoints)
//!                          └→ BackgroundTasks → TransportClient (HTTP)
//!        complete ──────────→ MetricsAggregator::refresh
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use mindful_tracking::{Config, Identity, UserContext};
//! use mindful_tracking::tracking::SessionType;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let ctx = UserContext::from_config(&config, Identity::signed_in("user-1")).await?;
//!     ctx.mount().await;
//!
//!     ctx.sessions.start(SessionType::Meditation, None).await;
//!     ctx.sessions.update_progress(50, None).await;
//!     ctx.sessions.complete(Some(5)).await;
//!
//!     ctx.shutdown().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Fire-and-forget task runner.
pub mod background;
/// Command-line interface.
pub mod cli;
/// Configuration management.
pub mod config;
/// Per-user context wiring.
pub mod context;
/// Error types and result aliases for the application.
pub mod error;
/// Current authenticated user.
pub mod identity;
/// Progress statistics.
pub mod metrics;
/// User-facing notification sink.
pub mod notify;
/// Preference loading, merging and persistence.
pub mod preferences;
/// SQLite storage layer for persistence.
pub mod storage;
/// Session lifecycle and interaction tracking.
pub mod tracking;
/// Resilient HTTP transport and endpoint wrappers.
pub mod transport;

pub use config::Config;
pub use context::UserContext;
pub use error::{AppError, AppResult};
pub use identity::Identity;
