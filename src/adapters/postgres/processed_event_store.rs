//! PostgreSQL implementation of the idempotency ledger.
//!
//! The table carries a unique constraint on `(transaction_id, event_type)`.
//! `record` relies on `ON CONFLICT DO NOTHING` and the reported row count to
//! distinguish a first insert from a duplicate, so the database constraint
//! is the arbiter under concurrent deliveries, not application state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{ProcessedEvent, ProcessedEventStore, RecordOutcome};

/// PostgreSQL implementation of the ProcessedEventStore port.
pub struct PostgresProcessedEventStore {
    pool: PgPool,
}

impl PostgresProcessedEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProcessedEventStore for PostgresProcessedEventStore {
    async fn is_processed(
        &self,
        transaction_id: &str,
        event_type: &str,
    ) -> Result<bool, DomainError> {
        let exists: Option<(i32,)> = sqlx::query_as(
            r#"
            SELECT 1 FROM subscription_events
            WHERE transaction_id = $1 AND event_type = $2
            "#,
        )
        .bind(transaction_id)
        .bind(event_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to check ledger: {}", e)))?;

        Ok(exists.is_some())
    }

    async fn record(&self, event: ProcessedEvent) -> Result<RecordOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscription_events (
                transaction_id, event_type, user_id, subscription_id,
                event_data, processed_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (transaction_id, event_type) DO NOTHING
            "#,
        )
        .bind(&event.transaction_id)
        .bind(&event.event_type)
        .bind(event.user_id.map(|id| *id.as_uuid()))
        .bind(event.subscription_id.map(|id| *id.as_uuid()))
        .bind(&event.event_data)
        .bind(event.processed_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to append to ledger: {}", e)))?;

        if result.rows_affected() == 0 {
            Ok(RecordOutcome::Duplicate)
        } else {
            Ok(RecordOutcome::Recorded)
        }
    }

    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let cutoff: DateTime<Utc> = *cutoff.as_datetime();
        let result = sqlx::query(
            r#"
            DELETE FROM subscription_events WHERE processed_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to prune ledger: {}", e)))?;

        Ok(result.rows_affected())
    }
}
