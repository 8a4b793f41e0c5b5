//! Webhook processing error taxonomy.
//!
//! Only authentication, server misconfiguration, and malformed payloads are
//! surfaced as non-2xx responses. Business-level misses are absorbed and
//! acknowledged so the provider's redelivery-on-non-2xx behavior cannot
//! amplify a persistent data problem into a retry storm.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Shared-secret token missing or mismatched.
    #[error("Authentication failed")]
    Authentication,

    /// Shared secret not provisioned on the server side.
    #[error("Webhook secret not configured")]
    Configuration,

    /// Body is not valid JSON or missing the required shape.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// No user found for the event's customer email.
    #[error("No user for email '{0}'")]
    UnresolvedIdentity(String),

    /// No plan matched the event's offer or product id.
    #[error("No plan for offer '{0}'")]
    UnmatchedPlan(String),

    /// Write to the ledger or subscription store failed.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl WebhookError {
    /// Returns true if this error is surfaced to the provider as a non-2xx
    /// response. Everything else is absorbed, logged, and acknowledged.
    pub fn is_surfaced(&self) -> bool {
        matches!(
            self,
            WebhookError::Authentication
                | WebhookError::Configuration
                | WebhookError::MalformedPayload(_)
        )
    }

    /// Maps the error to the HTTP status code the router returns.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::Authentication => StatusCode::UNAUTHORIZED,
            WebhookError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            WebhookError::MalformedPayload(_) => StatusCode::BAD_REQUEST,

            // Absorbed errors are acknowledged; these mappings exist for the
            // audit log, not for the wire.
            WebhookError::UnresolvedIdentity(_)
            | WebhookError::UnmatchedPlan(_)
            | WebhookError::Persistence(_) => StatusCode::OK,
        }
    }
}

impl From<crate::domain::foundation::DomainError> for WebhookError {
    fn from(err: crate::domain::foundation::DomainError) -> Self {
        WebhookError::Persistence(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_is_surfaced_as_401() {
        let err = WebhookError::Authentication;
        assert!(err.is_surfaced());
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn configuration_is_surfaced_as_500() {
        let err = WebhookError::Configuration;
        assert!(err.is_surfaced());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn malformed_payload_is_surfaced_as_400() {
        let err = WebhookError::MalformedPayload("expected object".to_string());
        assert!(err.is_surfaced());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unresolved_identity_is_absorbed() {
        let err = WebhookError::UnresolvedIdentity("ghost@example.com".to_string());
        assert!(!err.is_surfaced());
        assert_eq!(err.status_code(), StatusCode::OK);
    }

    #[test]
    fn persistence_failure_is_absorbed() {
        let err = WebhookError::Persistence("connection refused".to_string());
        assert!(!err.is_surfaced());
        assert_eq!(err.status_code(), StatusCode::OK);
    }

    #[test]
    fn unmatched_plan_is_absorbed() {
        let err = WebhookError::UnmatchedPlan("offer_x".to_string());
        assert!(!err.is_surfaced());
    }

    #[test]
    fn display_includes_context() {
        let err = WebhookError::UnresolvedIdentity("ghost@example.com".to_string());
        assert_eq!(format!("{}", err), "No user for email 'ghost@example.com'");
    }
}
