//! PostgreSQL implementation of EntitlementStore.
//!
//! Grants are naturally idempotent through `ON CONFLICT DO NOTHING` on the
//! `(user_id, product_id)` primary key; revokes are idempotent because a
//! missing row deletes zero rows without error.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::EntitlementStore;

/// PostgreSQL implementation of the EntitlementStore port.
pub struct PostgresEntitlementStore {
    pool: PgPool,
}

impl PostgresEntitlementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntitlementStore for PostgresEntitlementStore {
    async fn grant(&self, user_id: &UserId, product_id: &str) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO entitlements (user_id, product_id, granted_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id, product_id) DO NOTHING
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(product_id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to grant entitlement: {}", e)))?;

        Ok(())
    }

    async fn revoke(&self, user_id: &UserId, product_id: &str) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            DELETE FROM entitlements WHERE user_id = $1 AND product_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(product_id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to revoke entitlement: {}", e)))?;

        Ok(())
    }
}
