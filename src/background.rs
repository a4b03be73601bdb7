//! Fire-and-forget task runner.
//!
//! Callers hand off work that must never block or fail their own flow
//! (analytics events, remote echoes). Each finished task leaves a
//! [`TaskOutcome`]; [`BackgroundTasks::flush`] waits for everything in flight
//! and hands the outcomes back.

use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tracing::{debug, warn};

/// Outcomes kept before the oldest are dropped.
const MAX_RETAINED_OUTCOMES: usize = 256;

/// Result of one background task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Label given at spawn time.
    pub label: String,
    /// `Err` carries the rendered error.
    pub result: Result<(), String>,
}

impl TaskOutcome {
    /// Whether the task succeeded.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Default)]
struct Inner {
    in_flight: AtomicUsize,
    idle: Notify,
    outcomes: Mutex<VecDeque<TaskOutcome>>,
}

impl Inner {
    fn push(&self, outcome: TaskOutcome) {
        let mut outcomes = self
            .outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if outcomes.len() == MAX_RETAINED_OUTCOMES {
            outcomes.pop_front();
        }
        outcomes.push_back(outcome);
    }
}

/// Decrements the in-flight count even if the task panics.
struct InFlightGuard(Arc<Inner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Handle to a set of background tasks. Clones share the same set.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Inner>,
}

impl BackgroundTasks {
    /// Create an empty task set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` on the runtime without waiting for it.
    ///
    /// Errors are logged and recorded, never returned.
    pub fn spawn<F, T, E>(&self, label: impl Into<String>, task: F)
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let label = label.into();
        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlightGuard(Arc::clone(&self.inner));

        tokio::spawn(async move {
            let result = match task.await {
                Ok(_) => {
                    debug!(task = %label, "Background task finished");
                    Ok(())
                }
                Err(e) => {
                    warn!(task = %label, error = %e, "Background task failed");
                    Err(e.to_string())
                }
            };
            guard.0.push(TaskOutcome { label, result });
            drop(guard);
        });
    }

    /// Number of tasks still running.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Take the outcomes recorded so far without waiting.
    pub fn drain(&self) -> Vec<TaskOutcome> {
        self.inner
            .outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain(..)
            .collect()
    }

    /// Wait until no task is running, then take every recorded outcome.
    pub async fn flush(&self) -> Vec<TaskOutcome> {
        loop {
            let idle = self.inner.idle.notified();
            if self.in_flight() == 0 {
                break;
            }
            idle.await;
        }
        self.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_flush_waits_for_every_task() {
        let tasks = BackgroundTasks::new();

        tasks.spawn("slow", async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok::<_, String>(())
        });
        tasks.spawn("failing", async { Err::<(), _>("remote down") });

        let mut outcomes = tasks.flush().await;
        outcomes.sort_by(|a, b| a.label.cmp(&b.label));

        assert_eq!(tasks.in_flight(), 0);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].label, "failing");
        assert_eq!(outcomes[0].result, Err("remote down".to_string()));
        assert!(outcomes[1].is_ok());
    }

    #[tokio::test]
    async fn test_flush_on_idle_set_returns_immediately() {
        let tasks = BackgroundTasks::new();
        assert!(tasks.flush().await.is_empty());
    }

    #[tokio::test]
    #[allow(unreachable_code)]
    async fn test_panicking_task_does_not_wedge_flush() {
        let tasks = BackgroundTasks::new();
        tasks.spawn("panics", async {
            panic!("boom");
            Ok::<_, String>(())
        });

        let outcomes = tasks.flush().await;
        assert!(outcomes.is_empty());
        assert_eq!(tasks.in_flight(), 0);
    }
}
