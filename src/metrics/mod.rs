//! Progress statistics.
//!
//! [`compute`] derives a [`ProgressSnapshot`] from the full set of completed
//! checkpoints. Snapshots are always rebuilt from scratch, never patched.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StorageResult;
use crate::identity::Identity;
use crate::storage::{ProgressRecord, Storage};

/// Completed sessions per achievement tier.
pub const SESSIONS_PER_ACHIEVEMENT: u64 = 5;

/// Aggregate progress of one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    /// Number of records considered.
    pub total_sessions: u64,
    /// Percentage points accumulated over completed records. Not wall-clock
    /// minutes despite the name.
    pub total_minutes: u64,
    /// Consecutive days ending today or yesterday.
    pub current_streak: u32,
    /// Longest run of consecutive days.
    pub longest_streak: u32,
    /// One per five sessions.
    pub achievements_unlocked: u64,
    /// Most frequent category, earliest wins ties.
    pub favorite_category: Option<String>,
    /// `total_minutes / total_sessions`, zero when there are none.
    pub average_session_length: f64,
}

/// Build a snapshot from `records`, in their given order, as of `today`.
pub fn compute(records: &[ProgressRecord], today: NaiveDate) -> ProgressSnapshot {
    let total_sessions = records.len() as u64;
    let total_minutes: u64 = records
        .iter()
        .filter(|r| r.completed)
        .map(|r| u64::from(r.percentage))
        .sum();

    let average_session_length = if total_sessions == 0 {
        0.0
    } else {
        total_minutes as f64 / total_sessions as f64
    };

    let (current_streak, longest_streak) = streaks(records, today);

    ProgressSnapshot {
        total_sessions,
        total_minutes,
        current_streak,
        longest_streak,
        achievements_unlocked: total_sessions / SESSIONS_PER_ACHIEVEMENT,
        favorite_category: favorite_category(records),
        average_session_length,
    }
}

fn favorite_category(records: &[ProgressRecord]) -> Option<String> {
    // (category, count) in first-seen order
    let mut counts: Vec<(&str, u32)> = Vec::new();
    for category in records.iter().filter_map(|r| r.category.as_deref()) {
        match counts.iter_mut().find(|(c, _)| *c == category) {
            Some((_, n)) => *n += 1,
            None => counts.push((category, 1)),
        }
    }

    let mut best: Option<(&str, u32)> = None;
    for (category, n) in counts {
        if best.map_or(true, |(_, top)| n > top) {
            best = Some((category, n));
        }
    }
    best.map(|(category, _)| category.to_string())
}

/// Returns `(current, longest)`.
fn streaks(records: &[ProgressRecord], today: NaiveDate) -> (u32, u32) {
    let mut days: Vec<NaiveDate> = records
        .iter()
        .filter(|r| r.completed)
        .filter_map(|r| r.completed_at)
        .map(|at| at.date_naive())
        .collect();
    days.sort_unstable();
    days.dedup();

    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in &days {
        run = match previous {
            Some(prev) if prev.succ_opt() == Some(*day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }

    let yesterday = today.pred_opt().unwrap_or(today);
    let current = match days.last() {
        Some(last) if *last >= yesterday => run,
        _ => 0,
    };

    (current, longest)
}

/// Keeps the latest snapshot of one user context.
pub struct MetricsAggregator {
    storage: Arc<dyn Storage>,
    identity: Identity,
    latest: RwLock<Option<ProgressSnapshot>>,
}

impl MetricsAggregator {
    /// Create an aggregator with no snapshot yet.
    pub fn new(storage: Arc<dyn Storage>, identity: Identity) -> Self {
        Self {
            storage,
            identity,
            latest: RwLock::new(None),
        }
    }

    /// Recompute from storage. `Ok(None)` when nobody is signed in.
    pub async fn refresh(&self) -> StorageResult<Option<ProgressSnapshot>> {
        let Some(user_id) = self.identity.user_id() else {
            return Ok(None);
        };

        let records = self.storage.list_completed_sessions(&user_id).await?;
        let snapshot = compute(&records, Utc::now().date_naive());

        debug!(
            user_id = %user_id,
            total_sessions = snapshot.total_sessions,
            current_streak = snapshot.current_streak,
            "Progress snapshot refreshed"
        );

        *self.latest.write().await = Some(snapshot.clone());
        Ok(Some(snapshot))
    }

    /// Last computed snapshot.
    pub async fn snapshot(&self) -> Option<ProgressSnapshot> {
        self.latest.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(date: NaiveDate, hour: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
    }

    fn completed_on(date: NaiveDate, category: &str) -> ProgressRecord {
        ProgressRecord::new("u-1", uuid::Uuid::new_v4().to_string(), 100, true)
            .with_category(category)
            .with_completed_at(at(date, 9))
    }

    #[test]
    fn test_empty_history() {
        let snapshot = compute(&[], day(2026, 3, 10));
        assert_eq!(snapshot, ProgressSnapshot::default());
        assert_eq!(snapshot.average_session_length, 0.0);
        assert!(snapshot.favorite_category.is_none());
    }

    #[test]
    fn test_achievement_tiers() {
        let today = day(2026, 3, 10);
        for (count, expected) in [(4, 0), (5, 1), (12, 2)] {
            let records: Vec<_> = (0..count).map(|_| completed_on(today, "meditation")).collect();
            assert_eq!(compute(&records, today).achievements_unlocked, expected);
        }
    }

    #[test]
    fn test_favorite_category_tie_goes_to_first_seen() {
        let today = day(2026, 3, 10);
        let records = vec![
            completed_on(today, "A"),
            completed_on(today, "B"),
            completed_on(today, "A"),
            completed_on(today, "B"),
        ];
        assert_eq!(compute(&records, today).favorite_category.as_deref(), Some("A"));
    }

    #[test]
    fn test_favorite_category_majority() {
        let today = day(2026, 3, 10);
        let records = vec![
            completed_on(today, "breathing"),
            completed_on(today, "reading"),
            completed_on(today, "reading"),
        ];
        assert_eq!(
            compute(&records, today).favorite_category.as_deref(),
            Some("reading")
        );
    }

    #[test]
    fn test_totals_sum_percentages_of_completed_only() {
        let today = day(2026, 3, 10);
        let mut partial = ProgressRecord::new("u-1", "s-partial", 40, false);
        partial.category = Some("reading".to_string());
        let records = vec![
            completed_on(today, "meditation"),
            partial,
            completed_on(today, "meditation"),
        ];

        let snapshot = compute(&records, today);
        assert_eq!(snapshot.total_sessions, 3);
        assert_eq!(snapshot.total_minutes, 200);
        assert!((snapshot.average_session_length - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_streaks_current_run_ending_today() {
        let today = day(2026, 3, 10);
        let records = vec![
            completed_on(day(2026, 3, 1), "m"),
            completed_on(day(2026, 3, 2), "m"),
            completed_on(day(2026, 3, 3), "m"),
            completed_on(day(2026, 3, 4), "m"),
            completed_on(day(2026, 3, 9), "m"),
            completed_on(day(2026, 3, 10), "m"),
            // Same day twice counts once.
            completed_on(day(2026, 3, 10), "m"),
        ];

        let snapshot = compute(&records, today);
        assert_eq!(snapshot.current_streak, 2);
        assert_eq!(snapshot.longest_streak, 4);
    }

    #[test]
    fn test_streak_ending_yesterday_still_counts() {
        let today = day(2026, 3, 10);
        let records = vec![
            completed_on(day(2026, 3, 8), "m"),
            completed_on(day(2026, 3, 9), "m"),
        ];
        assert_eq!(compute(&records, today).current_streak, 2);
    }

    #[test]
    fn test_streak_resets_after_missed_day() {
        let today = day(2026, 3, 10);
        let records = vec![
            completed_on(day(2026, 3, 6), "m"),
            completed_on(day(2026, 3, 7), "m"),
            completed_on(day(2026, 3, 8), "m"),
        ];

        let snapshot = compute(&records, today);
        assert_eq!(snapshot.current_streak, 0);
        assert_eq!(snapshot.longest_streak, 3);
    }

    #[test]
    fn test_streak_spans_month_boundary() {
        let today = day(2026, 3, 1);
        let records = vec![
            completed_on(day(2026, 2, 27), "m"),
            completed_on(day(2026, 2, 28), "m"),
            completed_on(day(2026, 3, 1), "m"),
        ];
        let snapshot = compute(&records, today);
        assert_eq!(snapshot.current_streak, 3);
        assert_eq!(snapshot.longest_streak, 3);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let today = day(2026, 3, 10);
        let records = vec![
            completed_on(day(2026, 3, 9), "reading"),
            completed_on(day(2026, 3, 10), "breathing"),
        ];
        assert_eq!(compute(&records, today), compute(&records, today));
    }
}
