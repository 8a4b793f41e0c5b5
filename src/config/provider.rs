//! Payment provider configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Payment provider configuration.
///
/// The shared webhook token is loaded once at startup and held in a
/// [`SecretString`] so it never appears in debug output or logs.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Shared secret expected on every inbound webhook
    pub webhook_token: SecretString,
}

impl ProviderConfig {
    /// Validate provider configuration
    ///
    /// A missing or blank token means requests can never authenticate, so
    /// startup fails rather than serving 500s to the provider.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.webhook_token.expose_secret().trim().is_empty() {
            return Err(ValidationError::EmptyWebhookToken);
        }
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            webhook_token: SecretString::new(String::new()),
        }
    }
}
