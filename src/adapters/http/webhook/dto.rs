//! Wire types for the webhook endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::billing::WebhookAction;

/// Acknowledgement body. The provider treats any 2xx as delivered; the
/// `action` field exists for operators replaying deliveries by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub success: bool,
    pub action: String,
}

impl WebhookAck {
    pub fn ok(action: WebhookAction) -> Self {
        Self {
            success: true,
            action: action.as_str().to_string(),
        }
    }

    /// Acknowledgement for a failure that must not trigger redelivery. The
    /// event had no applied effect, so it reports the log-only action.
    pub fn absorbed() -> Self {
        Self {
            success: true,
            action: WebhookAction::LogOnly.as_str().to_string(),
        }
    }
}

/// Error body for the surfaced failures (401, 400, 500).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.to_string(),
            message: message.into(),
        }
    }
}

/// Health probe body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
