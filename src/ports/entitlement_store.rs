//! EntitlementStore port - grants for one-time purchases.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};

/// Stores which users hold which one-time product entitlements.
///
/// Grant and revoke are idempotent: granting an entitlement the user already
/// holds, or revoking one they do not, succeeds without effect.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    async fn grant(&self, user_id: &UserId, product_id: &str) -> Result<(), DomainError>;

    async fn revoke(&self, user_id: &UserId, product_id: &str) -> Result<(), DomainError>;
}
