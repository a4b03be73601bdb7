//! Typed wrappers for the remote endpoints.

use serde::Serialize;
use serde_json::{json, Value};

use super::client::TransportClient;
use super::types::{
    endpoints, HealthStatus, HttpMethod, InteractionEvent, RequestOptions, SessionEvent,
    GENERATE_EXERCISE_TIMEOUT, GENERATE_MEDITATION_TIMEOUT,
};
use crate::error::TransportResult;

impl TransportClient {
    async fn post<B: Serialize>(&self, endpoint: &str, body: &B) -> TransportResult<Value> {
        let options = RequestOptions::new().with_body(serde_json::to_value(body)?);
        self.request(endpoint, HttpMethod::Post, options).await
    }

    /// Report a session lifecycle event.
    pub async fn track_session(&self, event: &SessionEvent) -> TransportResult<Value> {
        self.post(endpoints::TRACK_SESSION, event).await
    }

    /// Report a discrete interaction.
    pub async fn track_interaction(&self, event: &InteractionEvent) -> TransportResult<Value> {
        self.post(endpoints::TRACK_INTERACTION, event).await
    }

    /// Fetch the remote copy of a user's preferences.
    pub async fn get_user_preferences(&self, user_id: &str) -> TransportResult<Value> {
        self.request(
            &endpoints::user_preferences(user_id),
            HttpMethod::Get,
            RequestOptions::new(),
        )
        .await
    }

    /// Replace the remote copy of a user's preferences.
    pub async fn update_user_preferences<P: Serialize>(
        &self,
        user_id: &str,
        preferences: &P,
    ) -> TransportResult<Value> {
        let options = RequestOptions::new().with_body(serde_json::to_value(preferences)?);
        self.request(
            &endpoints::user_preferences(user_id),
            HttpMethod::Put,
            options,
        )
        .await
    }

    /// Ask for content recommendations.
    pub async fn get_recommendations(
        &self,
        user_id: &str,
        context: Option<Value>,
    ) -> TransportResult<Value> {
        self.post(
            endpoints::RECOMMENDATIONS,
            &json!({ "userId": user_id, "context": context }),
        )
        .await
    }

    /// Liveness check.
    pub async fn health_check(&self) -> TransportResult<HealthStatus> {
        self.request(endpoints::HEALTH, HttpMethod::Get, RequestOptions::new())
            .await
    }

    /// Generate a guided meditation script.
    pub async fn generate_meditation(
        &self,
        prompt: &str,
        preferences: Option<Value>,
    ) -> TransportResult<Value> {
        let options = RequestOptions::new()
            .with_timeout(GENERATE_MEDITATION_TIMEOUT)
            .with_body(json!({ "prompt": prompt, "preferences": preferences }));
        self.request(endpoints::GENERATE_MEDITATION, HttpMethod::Post, options)
            .await
    }

    /// Generate an exercise for a category and duration (minutes).
    pub async fn generate_exercise(&self, category: &str, duration: u32) -> TransportResult<Value> {
        let options = RequestOptions::new()
            .with_timeout(GENERATE_EXERCISE_TIMEOUT)
            .with_body(json!({ "category": category, "duration": duration }));
        self.request(endpoints::GENERATE_EXERCISE, HttpMethod::Post, options)
            .await
    }

    /// Generate a personalised tip.
    pub async fn generate_tip(&self, user_id: &str, context: Option<Value>) -> TransportResult<Value> {
        self.post(
            endpoints::GENERATE_TIP,
            &json!({ "userId": user_id, "context": context }),
        )
        .await
    }
}
