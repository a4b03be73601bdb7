use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Logical endpoint paths, relative to the configured base URL.
pub mod endpoints {
    /// Session lifecycle events.
    pub const TRACK_SESSION: &str = "/track/session";
    /// Discrete interaction events.
    pub const TRACK_INTERACTION: &str = "/track/interaction";
    /// Personalised recommendations.
    pub const RECOMMENDATIONS: &str = "/recommendations";
    /// Liveness check.
    pub const HEALTH: &str = "/health";
    /// Guided meditation generation.
    pub const GENERATE_MEDITATION: &str = "/generate/meditation";
    /// Exercise generation.
    pub const GENERATE_EXERCISE: &str = "/generate/exercise";
    /// Personalised tip generation.
    pub const GENERATE_TIP: &str = "/generate/tip";

    /// Per-user preferences resource.
    pub fn user_preferences(user_id: &str) -> String {
        format!("/users/{}/preferences", user_id)
    }
}

/// Timeout for meditation generation, which runs well past the default.
pub const GENERATE_MEDITATION_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for exercise generation.
pub const GENERATE_EXERCISE_TIMEOUT: Duration = Duration::from_secs(20);

/// HTTP method of a logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET; never carries a body.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// DELETE.
    Delete,
}

impl HttpMethod {
    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether a request body may be attached.
    pub fn allows_body(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Per-request overrides. Unset fields fall back to the client's
/// `RequestConfig`.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Per-attempt timeout.
    pub timeout: Option<Duration>,
    /// Retries after the first attempt.
    pub retries: Option<u32>,
    /// Extra headers sent on every attempt.
    pub headers: HashMap<String, String>,
    /// JSON body, sent for non-GET methods only.
    pub body: Option<Value>,
}

impl RequestOptions {
    /// Options with every field defaulted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the retry budget (total attempts = retries + 1).
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Add an extra header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attach a JSON body. Ignored for GET requests.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Outcome of a single attempt within one logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 2xx with a parseable body.
    Success,
    /// Non-2xx status.
    HttpStatus(u16),
    /// The attempt timer fired first.
    Timeout,
    /// Connection or transport failure.
    Network,
    /// 2xx whose body did not parse.
    InvalidBody,
}

impl AttemptOutcome {
    /// Short label for log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::HttpStatus(_) => "http_status",
            AttemptOutcome::Timeout => "timeout",
            AttemptOutcome::Network => "network",
            AttemptOutcome::InvalidBody => "invalid_body",
        }
    }

    /// True only for `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success)
    }
}

/// Observability record emitted for every attempt.
#[derive(Debug, Clone)]
pub struct RequestAttempt {
    /// Logical endpoint path.
    pub endpoint: String,
    /// Method of the request.
    pub method: HttpMethod,
    /// 1-based.
    pub attempt_number: u32,
    /// How the attempt ended.
    pub outcome: AttemptOutcome,
    /// Wall time of the attempt.
    pub latency_ms: u64,
}

/// Lifecycle action reported to `/track/session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    /// Session started.
    Start,
    /// Progress checkpoint.
    Progress,
    /// Session completed.
    Complete,
}

/// Payload for `/track/session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEvent {
    /// Session owner.
    pub user_id: String,
    /// Session the event belongs to.
    pub session_id: String,
    /// Lifecycle action.
    pub action: SessionAction,
    /// Session type name (start and complete only).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub session_type: Option<String>,
    /// Percentage (progress only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    /// Elapsed milliseconds (complete only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// User rating (complete only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    /// When the action happened; the remote orders and dedups on it.
    pub timestamp: DateTime<Utc>,
    /// Caller metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl SessionEvent {
    /// Bare event stamped with the current time.
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        action: SessionAction,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            action,
            session_type: None,
            progress: None,
            duration: None,
            rating: None,
            timestamp: Utc::now(),
            metadata: None,
        }
    }
}

/// Payload for `/track/interaction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    /// Acting user.
    pub user_id: String,
    /// Action name, e.g. `like`.
    pub action: String,
    /// Content the action applies to.
    pub target: String,
    /// When the action happened.
    pub timestamp: DateTime<Utc>,
    /// Caller metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Response of `/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Reported status, `ok` when healthy.
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_never_carries_body() {
        assert!(!HttpMethod::Get.allows_body());
        assert!(HttpMethod::Put.allows_body());
    }

    #[test]
    fn test_user_preferences_path() {
        assert_eq!(endpoints::user_preferences("u-1"), "/users/u-1/preferences");
    }

    #[test]
    fn test_session_event_wire_names() {
        let mut event = SessionEvent::new("u-1", "s-1", SessionAction::Complete);
        event.session_type = Some("meditation".to_string());
        event.duration = Some(1200);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["userId"], json!("u-1"));
        assert_eq!(value["sessionId"], json!("s-1"));
        assert_eq!(value["action"], json!("complete"));
        assert_eq!(value["type"], json!("meditation"));
        assert_eq!(value["duration"], json!(1200));
        assert!(value.get("rating").is_none());
        assert!(value.get("progress").is_none());
    }

    #[test]
    fn test_request_options_builder() {
        let options = RequestOptions::new()
            .with_timeout(Duration::from_millis(250))
            .with_retries(0)
            .with_header("X-Trace", "abc");

        assert_eq!(options.timeout, Some(Duration::from_millis(250)));
        assert_eq!(options.retries, Some(0));
        assert_eq!(options.headers.get("X-Trace").map(String::as_str), Some("abc"));
        assert!(options.body.is_none());
    }
}
