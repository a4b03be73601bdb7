//! Resilient request transport.
//!
//! Every remote call goes through [`TransportClient::request`], which bounds
//! each attempt with a timer, retries failures with exponential backoff and
//! reports each attempt to an [`AttemptSink`].

mod api;
mod client;
mod observe;
mod types;

pub use client::{backoff_delay, TransportClient};
pub use observe::{AttemptSink, MemoryAttemptSink, TracingAttemptSink};
pub use types::{
    endpoints, AttemptOutcome, HealthStatus, HttpMethod, InteractionEvent, RequestAttempt,
    RequestOptions, SessionAction, SessionEvent, GENERATE_EXERCISE_TIMEOUT,
    GENERATE_MEDITATION_TIMEOUT,
};
