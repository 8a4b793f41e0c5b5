//! Axum router for the webhook endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{handle_provider_webhook, health, WebhookAppState};

/// Create the webhook router.
///
/// # Routes
///
/// - `POST /webhooks/provider` - inbound payment provider events
///   (no user auth; verified against the shared webhook token)
/// - `GET /health` - liveness probe
pub fn webhook_router() -> Router<WebhookAppState> {
    Router::new()
        .route("/webhooks/provider", post(handle_provider_webhook))
        .route("/health", get(health))
}
