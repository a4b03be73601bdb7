use std::sync::Mutex;

use tracing::{debug, warn};

use super::types::RequestAttempt;

/// Receives one record per request attempt.
pub trait AttemptSink: Send + Sync {
    /// Record an attempt. Must not block.
    fn record(&self, attempt: &RequestAttempt);
}

/// Emits attempts as structured tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAttemptSink;

impl AttemptSink for TracingAttemptSink {
    fn record(&self, attempt: &RequestAttempt) {
        if attempt.outcome.is_success() {
            debug!(
                endpoint = %attempt.endpoint,
                method = %attempt.method,
                attempt = attempt.attempt_number,
                outcome = attempt.outcome.as_str(),
                latency_ms = attempt.latency_ms,
                "Request attempt"
            );
        } else {
            warn!(
                endpoint = %attempt.endpoint,
                method = %attempt.method,
                attempt = attempt.attempt_number,
                outcome = attempt.outcome.as_str(),
                latency_ms = attempt.latency_ms,
                "Request attempt failed"
            );
        }
    }
}

/// Collects attempts in memory.
#[derive(Debug, Default)]
pub struct MemoryAttemptSink {
    attempts: Mutex<Vec<RequestAttempt>>,
}

impl MemoryAttemptSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts recorded so far, in order.
    pub fn attempts(&self) -> Vec<RequestAttempt> {
        self.attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Attempts recorded against one endpoint.
    pub fn attempts_for(&self, endpoint: &str) -> Vec<RequestAttempt> {
        self.attempts()
            .into_iter()
            .filter(|a| a.endpoint == endpoint)
            .collect()
    }
}

impl AttemptSink for MemoryAttemptSink {
    fn record(&self, attempt: &RequestAttempt) {
        self.attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(attempt.clone());
    }
}
