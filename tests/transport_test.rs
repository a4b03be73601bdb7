//! Integration tests for the transport client
//!
//! Tests retry, timeout and observability behavior using wiremock for
//! request/response mocking.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use mindful_tracking::config::{ApiConfig, RequestConfig};
use mindful_tracking::error::TransportError;
use mindful_tracking::notify::{MemoryNotifier, Severity};
use mindful_tracking::transport::{
    endpoints, AttemptOutcome, HttpMethod, MemoryAttemptSink, RequestOptions, SessionAction,
    SessionEvent, TransportClient,
};

struct Harness {
    client: TransportClient,
    attempts: Arc<MemoryAttemptSink>,
    notices: Arc<MemoryNotifier>,
}

/// Create a test client pointing to mock server
fn create_test_client(base_url: &str, request: RequestConfig) -> Harness {
    let config = ApiConfig {
        base_url: base_url.to_string(),
        api_key: Some("test-api-key".to_string()),
    };
    let attempts = Arc::new(MemoryAttemptSink::new());
    let notices = Arc::new(MemoryNotifier::new());

    let client = TransportClient::new(&config, request)
        .expect("Failed to create client")
        .with_attempt_sink(attempts.clone())
        .with_notifier(notices.clone());

    Harness {
        client,
        attempts,
        notices,
    }
}

fn fast_request(max_retries: u32) -> RequestConfig {
    RequestConfig {
        timeout_ms: 2000,
        max_retries,
        backoff_base_ms: 5,
    }
}

#[cfg(test)]
mod success_tests {
    use super::*;

    #[tokio::test]
    async fn test_track_session_posts_event() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(endpoints::TRACK_SESSION))
            .and(header("Authorization", "Bearer test-api-key"))
            .and(header("Content-Type", "application/json"))
            .and(body_partial_json(json!({
                "userId": "u-1",
                "sessionId": "s-1",
                "action": "progress",
                "progress": 40
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let h = create_test_client(&mock_server.uri(), fast_request(3));
        let mut event = SessionEvent::new("u-1", "s-1", SessionAction::Progress);
        event.progress = Some(40);

        let response = h.client.track_session(&event).await;

        assert!(response.is_ok(), "Request should succeed: {:?}", response.err());
        assert_eq!(response.unwrap(), json!({ "ok": true }));

        let attempts = h.attempts.attempts();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].attempt_number, 1);
        assert_eq!(attempts[0].method, HttpMethod::Post);
        assert_eq!(attempts[0].outcome, AttemptOutcome::Success);
        assert!(h.notices.notices().is_empty());
    }

    #[tokio::test]
    async fn test_health_check() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(endpoints::HEALTH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
            .mount(&mock_server)
            .await;

        let h = create_test_client(&mock_server.uri(), fast_request(0));
        let health = tokio_test::assert_ok!(h.client.health_check().await);
        assert_eq!(health.status, "ok");
    }

    #[tokio::test]
    async fn test_get_sends_no_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/u-1/preferences"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "preferredDuration": 15 })),
            )
            .mount(&mock_server)
            .await;

        let h = create_test_client(&mock_server.uri(), fast_request(0));
        let options = RequestOptions::new().with_body(json!({ "ignored": true }));
        let result: Value = h
            .client
            .request("/users/u-1/preferences", HttpMethod::Get, options)
            .await
            .expect("GET should succeed");

        assert_eq!(result["preferredDuration"], 15);

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].body.is_empty(), "GET must not carry a body");
    }

    #[tokio::test]
    async fn test_custom_headers_are_sent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(endpoints::GENERATE_TIP))
            .and(header("X-Client", "journal"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tip": "breathe" })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let h = create_test_client(&mock_server.uri(), fast_request(0));
        let options = RequestOptions::new()
            .with_header("X-Client", "journal")
            .with_body(json!({ "userId": "u-1" }));
        let result: Value = h
            .client
            .request(endpoints::GENERATE_TIP, HttpMethod::Post, options)
            .await
            .expect("request should succeed");

        assert_eq!(result["tip"], "breathe");
    }

    #[tokio::test]
    async fn test_update_user_preferences_uses_put() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/users/u-1/preferences"))
            .and(body_partial_json(json!({ "preferredDuration": 25 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let h = create_test_client(&mock_server.uri(), fast_request(0));
        let result = h
            .client
            .update_user_preferences("u-1", &json!({ "preferredDuration": 25 }))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let mock_server = MockServer::start().await;

        // First call fails, later calls succeed
        Mock::given(method("POST"))
            .and(path(endpoints::TRACK_INTERACTION))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path(endpoints::TRACK_INTERACTION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&mock_server)
            .await;

        let h = create_test_client(&mock_server.uri(), fast_request(2));
        let result: Result<Value, _> = h
            .client
            .request(
                endpoints::TRACK_INTERACTION,
                HttpMethod::Post,
                RequestOptions::new().with_body(json!({ "action": "like" })),
            )
            .await;

        assert!(result.is_ok(), "Retry should recover: {:?}", result.err());

        let outcomes: Vec<AttemptOutcome> =
            h.attempts.attempts().into_iter().map(|a| a.outcome).collect();
        assert_eq!(
            outcomes,
            vec![AttemptOutcome::HttpStatus(503), AttemptOutcome::Success]
        );
        assert!(h.notices.notices().is_empty());
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_persistent_failure_makes_retries_plus_one_attempts() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(endpoints::RECOMMENDATIONS))
            .respond_with(ResponseTemplate::new(500))
            .expect(4)
            .mount(&mock_server)
            .await;

        let h = create_test_client(&mock_server.uri(), fast_request(3));
        let result = h.client.get_recommendations("u-1", None).await;

        match result {
            Err(TransportError::Exhausted { message, attempts }) => {
                assert_eq!(attempts, 4);
                assert_eq!(message, "HTTP 500: Internal Server Error");
            }
            other => panic!("Expected exhausted retries, got {:?}", other),
        }

        let attempts = h.attempts.attempts_for(endpoints::RECOMMENDATIONS);
        assert_eq!(attempts.len(), 4);
        let numbers: Vec<u32> = attempts.iter().map(|a| a.attempt_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert!(attempts
            .iter()
            .all(|a| a.outcome == AttemptOutcome::HttpStatus(500)));
    }

    #[tokio::test]
    async fn test_timeouts_exhaust_with_backoff_and_single_notice() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(endpoints::TRACK_SESSION))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "ok": true }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let request = RequestConfig {
            timeout_ms: 100,
            max_retries: 2,
            backoff_base_ms: 20,
        };
        let h = create_test_client(&mock_server.uri(), request);
        let event = SessionEvent::new("u-1", "s-1", SessionAction::Start);

        let started = Instant::now();
        let err = h
            .client
            .track_session(&event)
            .await
            .expect_err("every attempt times out");
        let elapsed = started.elapsed();

        assert_eq!(err.to_string(), "Request timed out");
        assert_eq!(err.attempts(), Some(3));

        // 3 x 100ms timeouts plus 40ms + 80ms of backoff
        assert!(
            elapsed >= Duration::from_millis(420),
            "finished too early: {:?}",
            elapsed
        );

        let attempts = h.attempts.attempts();
        assert_eq!(attempts.len(), 3);
        assert!(attempts.iter().all(|a| a.outcome == AttemptOutcome::Timeout));

        let notices = h.notices.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Connection Error");
        assert_eq!(notices[0].description, "Request timed out");
        assert_eq!(notices[0].severity, Severity::Destructive);
    }

    #[tokio::test]
    async fn test_per_call_timeout_override() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(endpoints::HEALTH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "ok" }))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&mock_server)
            .await;

        let h = create_test_client(&mock_server.uri(), fast_request(3));
        let options = RequestOptions::new()
            .with_timeout(Duration::from_millis(50))
            .with_retries(0);

        let result: Result<Value, _> = h
            .client
            .request(endpoints::HEALTH, HttpMethod::Get, options)
            .await;

        let err = result.expect_err("override should time out");
        assert_eq!(err.attempts(), Some(1));
        assert_eq!(err.to_string(), "Request timed out");
        assert_eq!(h.attempts.attempts()[0].outcome, AttemptOutcome::Timeout);
    }

    #[tokio::test]
    async fn test_unparseable_body_is_retried_as_invalid() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(endpoints::HEALTH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(2)
            .mount(&mock_server)
            .await;

        let h = create_test_client(&mock_server.uri(), fast_request(1));
        let result = h.client.health_check().await;

        let err = result.expect_err("body is not JSON");
        assert!(err.to_string().starts_with("Invalid response"));
        assert!(h
            .attempts
            .attempts()
            .iter()
            .all(|a| a.outcome == AttemptOutcome::InvalidBody));
    }

    #[tokio::test]
    async fn test_unreachable_host_reports_network_outcome() {
        let h = create_test_client("http://127.0.0.1:9", fast_request(1));
        let result = h.client.health_check().await;

        assert_eq!(result.expect_err("nothing listens").attempts(), Some(2));
        assert!(h
            .attempts
            .attempts()
            .iter()
            .all(|a| a.outcome == AttemptOutcome::Network));
        assert_eq!(h.notices.notices().len(), 1);
    }
}
