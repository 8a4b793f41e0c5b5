//! HTTP handlers for the provider webhook endpoint.
//!
//! Response policy: every authenticated, well-formed delivery is
//! acknowledged with 200 no matter what processing decided, because the
//! provider redelivers on any non-2xx and a persistent business failure
//! must not become a retry storm. The only non-200 responses are 401
//! (token missing or wrong), 500 (no token provisioned server-side) and
//! 400 (body is not JSON).

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::application::handlers::billing::ProcessWebhookHandler;
use crate::domain::billing::{ProviderEvent, WebhookError};

use super::dto::{ErrorResponse, HealthResponse, WebhookAck};

/// Shared application state for the webhook routes.
#[derive(Clone)]
pub struct WebhookAppState {
    pub handler: Arc<ProcessWebhookHandler>,
    /// Shared secret, loaded once at startup.
    pub webhook_token: SecretString,
}

/// POST /webhooks/provider
pub async fn handle_provider_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    match process(&state, &headers, &body).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(err) if err.is_surfaced() => {
            let code = match &err {
                WebhookError::Authentication => "AUTHENTICATION_FAILED",
                WebhookError::Configuration => "WEBHOOK_NOT_CONFIGURED",
                _ => "MALFORMED_PAYLOAD",
            };
            (err.status_code(), Json(ErrorResponse::new(code, err.to_string()))).into_response()
        }
        Err(err) => {
            // Absorbed: acknowledged so the provider stops redelivering.
            warn!(error = %err, "webhook processing failed, acknowledging anyway");
            (StatusCode::OK, Json(WebhookAck::absorbed())).into_response()
        }
    }
}

async fn process(
    state: &WebhookAppState,
    headers: &HeaderMap,
    body: &str,
) -> Result<WebhookAck, WebhookError> {
    let expected = state.webhook_token.expose_secret();
    if expected.trim().is_empty() {
        return Err(WebhookError::Configuration);
    }

    let presented = presented_token(headers, body).ok_or(WebhookError::Authentication)?;
    if !tokens_match(&presented, expected) {
        return Err(WebhookError::Authentication);
    }

    let event: ProviderEvent = serde_json::from_str(body)
        .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

    let action = state.handler.handle(event).await?;
    Ok(WebhookAck::ok(action))
}

/// The provider is inconsistent about where it puts the token: newer
/// deliveries carry a header, older ones embed it in the payload.
fn presented_token(headers: &HeaderMap, body: &str) -> Option<String> {
    if let Some(token) = headers.get("x-provider-token").and_then(|v| v.to_str().ok()) {
        return Some(token.to_string());
    }
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        if let Some(bearer) = auth.strip_prefix("Bearer ") {
            return Some(bearer.to_string());
        }
    }
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("token").and_then(|t| t.as_str()).map(String::from))
}

/// Constant-time comparison; the slice impl already folds a length
/// mismatch into the failure branch without an early return.
fn tokens_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// GET /health
pub async fn health() -> Response {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_match_accepts_equal() {
        assert!(tokens_match("tok_secret", "tok_secret"));
    }

    #[test]
    fn tokens_match_rejects_different() {
        assert!(!tokens_match("tok_wrong", "tok_secret"));
    }

    #[test]
    fn tokens_match_rejects_prefix() {
        assert!(!tokens_match("tok_secret_longer", "tok_secret"));
        assert!(!tokens_match("tok_", "tok_secret"));
    }

    #[test]
    fn presented_token_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-provider-token", "from_header".parse().unwrap());
        let body = r#"{"token":"from_body"}"#;
        assert_eq!(presented_token(&headers, body).as_deref(), Some("from_header"));
    }

    #[test]
    fn presented_token_reads_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer from_bearer".parse().unwrap());
        assert_eq!(presented_token(&headers, "{}").as_deref(), Some("from_bearer"));
    }

    #[test]
    fn presented_token_falls_back_to_payload() {
        let headers = HeaderMap::new();
        let body = r#"{"token":"from_body"}"#;
        assert_eq!(presented_token(&headers, body).as_deref(), Some("from_body"));
    }

    #[test]
    fn presented_token_missing_everywhere() {
        let headers = HeaderMap::new();
        assert_eq!(presented_token(&headers, "{}"), None);
        assert_eq!(presented_token(&headers, "not json"), None);
    }
}
