use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use super::observe::{AttemptSink, TracingAttemptSink};
use super::types::{AttemptOutcome, HttpMethod, RequestAttempt, RequestOptions};
use crate::config::{ApiConfig, RequestConfig};
use crate::error::{TransportError, TransportResult};
use crate::notify::{Notice, Notifier, TracingNotifier};

/// Delay before retry `attempt` (1-based): `base_ms * 2^attempt`.
pub fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 2_u64.checked_pow(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor))
}

/// Gateway for every remote call.
///
/// A logical request is retried up to `retries` times after the first
/// attempt. Each attempt races a timer; attempts never overlap.
#[derive(Clone)]
pub struct TransportClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    request_config: RequestConfig,
    attempt_sink: Arc<dyn AttemptSink>,
    notifier: Arc<dyn Notifier>,
}

impl TransportClient {
    /// Create a new transport client
    pub fn new(config: &ApiConfig, request_config: RequestConfig) -> TransportResult<Self> {
        let client = Client::builder().build().map_err(TransportError::Client)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_config,
            attempt_sink: Arc::new(TracingAttemptSink),
            notifier: Arc::new(TracingNotifier),
        })
    }

    /// Replace the per-attempt observability sink.
    pub fn with_attempt_sink(mut self, sink: Arc<dyn AttemptSink>) -> Self {
        self.attempt_sink = sink;
        self
    }

    /// Replace the user-facing notification sink.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Default request settings.
    pub fn request_config(&self) -> &RequestConfig {
        &self.request_config
    }

    /// Execute one logical request with retries, backoff and timeout.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: HttpMethod,
        options: RequestOptions,
    ) -> TransportResult<T> {
        let timeout = options
            .timeout
            .unwrap_or_else(|| Duration::from_millis(self.request_config.timeout_ms));
        let retries = options.retries.unwrap_or(self.request_config.max_retries);
        let url = format!("{}{}", self.base_url, endpoint);

        let mut attempt: u32 = 0;

        loop {
            let start = Instant::now();
            let result = self.execute_attempt(&url, method, &options, timeout).await;
            let latency_ms = start.elapsed().as_millis() as u64;

            let outcome = match &result {
                Ok(_) => AttemptOutcome::Success,
                Err(TransportError::Http { status, .. }) => AttemptOutcome::HttpStatus(*status),
                Err(TransportError::Timeout { .. }) => AttemptOutcome::Timeout,
                Err(TransportError::InvalidResponse { .. }) => AttemptOutcome::InvalidBody,
                Err(_) => AttemptOutcome::Network,
            };
            self.attempt_sink.record(&RequestAttempt {
                endpoint: endpoint.to_string(),
                method,
                attempt_number: attempt + 1,
                outcome,
                latency_ms,
            });

            let err = match result {
                Ok(data) => {
                    debug!(%endpoint, %method, attempt = attempt + 1, latency_ms, "Request succeeded");
                    return Ok(data);
                }
                Err(e) => e,
            };

            attempt += 1;

            if attempt > retries {
                let message = match err {
                    TransportError::Timeout { .. } => "Request timed out".to_string(),
                    other => other.to_string(),
                };
                error!(
                    %endpoint,
                    %method,
                    attempts = attempt,
                    error = %message,
                    "Request failed after exhausting retries"
                );
                self.notifier
                    .notify(&Notice::error("Connection Error", message.clone()));
                return Err(TransportError::Exhausted {
                    message,
                    attempts: attempt,
                });
            }

            let delay = backoff_delay(self.request_config.backoff_base_ms, attempt);
            warn!(
                %endpoint,
                %method,
                retry = attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying request"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Execute a single attempt (internal)
    async fn execute_attempt<T: DeserializeOwned>(
        &self,
        url: &str,
        method: HttpMethod,
        options: &RequestOptions,
        timeout: Duration,
    ) -> TransportResult<T> {
        let mut builder = self
            .client
            .request(method.into(), url)
            .header("Content-Type", "application/json");

        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if method.allows_body() {
            if let Some(body) = &options.body {
                builder = builder.json(body);
            }
        }

        let attempt = async {
            let response = builder.send().await.map_err(TransportError::Network)?;
            let status = response.status();

            if !status.is_success() {
                return Err(TransportError::Http {
                    status: status.as_u16(),
                    message: status.canonical_reason().unwrap_or("Unknown").to_string(),
                });
            }

            response
                .json::<T>()
                .await
                .map_err(|e| TransportError::InvalidResponse {
                    message: format!("Failed to parse response: {}", e),
                })
        };

        match tokio::time::timeout(timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }
}
