//! PostgreSQL implementation of IdentityResolver.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::IdentityResolver;

/// PostgreSQL implementation of the IdentityResolver port.
///
/// Email comparison is case-insensitive; the provider does not guarantee
/// casing consistency across deliveries for the same customer.
pub struct PostgresIdentityResolver {
    pool: PgPool,
}

impl PostgresIdentityResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityResolver for PostgresIdentityResolver {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserId>, DomainError> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM users WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find user: {}", e)))?;

        Ok(row.map(|(id,)| UserId::from_uuid(id)))
    }
}
