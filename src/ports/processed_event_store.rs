//! ProcessedEventStore port - the idempotency ledger.
//!
//! The provider delivers at-least-once: timeouts, ambiguous acknowledgments,
//! and redeliveries all produce duplicates, sometimes concurrently. This
//! ledger is the authority for "already processed."
//!
//! ## Correctness boundary
//!
//! The application-level existence check is an optimization only; it is racy
//! by construction. The storage-level uniqueness constraint on
//! `(transaction_id, event_type)` is the real guard: `record` must be an
//! atomic insert that reports a conflict as [`RecordOutcome::Duplicate`]
//! rather than an error.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};

/// Append-only record of an applied webhook event.
#[derive(Debug, Clone)]
pub struct ProcessedEvent {
    /// Provider transaction hash; half of the idempotency key.
    pub transaction_id: String,

    /// Raw event type string; the other half of the idempotency key.
    pub event_type: String,

    /// Best-effort audit linkage.
    pub user_id: Option<UserId>,
    pub subscription_id: Option<SubscriptionId>,

    /// Full inbound payload, preserved verbatim.
    pub event_data: serde_json::Value,

    pub processed_at: Timestamp,
}

impl ProcessedEvent {
    pub fn new(
        transaction_id: impl Into<String>,
        event_type: impl Into<String>,
        event_data: serde_json::Value,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            event_type: event_type.into(),
            user_id: None,
            subscription_id: None,
            event_data,
            processed_at: Timestamp::now(),
        }
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_subscription(mut self, subscription_id: SubscriptionId) -> Self {
        self.subscription_id = Some(subscription_id);
        self
    }
}

/// Result of attempting to append to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First time this `(transaction_id, event_type)` pair was seen.
    Recorded,
    /// A concurrent or earlier delivery already recorded it. Success, not
    /// an error.
    Duplicate,
}

/// Port for the idempotency ledger.
#[async_trait]
pub trait ProcessedEventStore: Send + Sync {
    /// Existence check. An optimization for the fast path only; never the
    /// correctness boundary.
    async fn is_processed(
        &self,
        transaction_id: &str,
        event_type: &str,
    ) -> Result<bool, DomainError>;

    /// Atomically append. A unique-constraint conflict is reported as
    /// [`RecordOutcome::Duplicate`], not as an error.
    async fn record(&self, event: ProcessedEvent) -> Result<RecordOutcome, DomainError>;

    /// Delete ledger entries older than the cutoff (retention policy).
    /// Returns the number of entries deleted.
    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::testing::InMemoryProcessedEventStore;

    #[tokio::test]
    async fn first_record_is_recorded() {
        let store = InMemoryProcessedEventStore::new();
        let event = ProcessedEvent::new("txn_1", "approved", serde_json::json!({}));

        let outcome = store.record(event).await.unwrap();

        assert_eq!(outcome, RecordOutcome::Recorded);
        assert!(store.is_processed("txn_1", "approved").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_record_is_duplicate_not_error() {
        let store = InMemoryProcessedEventStore::new();
        store
            .record(ProcessedEvent::new("txn_1", "approved", serde_json::json!({})))
            .await
            .unwrap();

        let outcome = store
            .record(ProcessedEvent::new("txn_1", "approved", serde_json::json!({})))
            .await
            .unwrap();

        assert_eq!(outcome, RecordOutcome::Duplicate);
    }

    #[tokio::test]
    async fn same_transaction_different_event_type_is_distinct() {
        let store = InMemoryProcessedEventStore::new();
        store
            .record(ProcessedEvent::new("txn_1", "approved", serde_json::json!({})))
            .await
            .unwrap();

        let outcome = store
            .record(ProcessedEvent::new("txn_1", "refunded", serde_json::json!({})))
            .await
            .unwrap();

        assert_eq!(outcome, RecordOutcome::Recorded);
    }

    #[tokio::test]
    async fn delete_before_removes_old_entries() {
        let store = InMemoryProcessedEventStore::new();
        let mut old = ProcessedEvent::new("txn_old", "approved", serde_json::json!({}));
        old.processed_at = Timestamp::now().add_days(-60);
        store.record(old).await.unwrap();
        store
            .record(ProcessedEvent::new("txn_new", "approved", serde_json::json!({})))
            .await
            .unwrap();

        let deleted = store
            .delete_before(Timestamp::now().add_days(-30))
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert!(!store.is_processed("txn_old", "approved").await.unwrap());
        assert!(store.is_processed("txn_new", "approved").await.unwrap());
    }

    #[test]
    fn builder_attaches_audit_linkage() {
        let user = UserId::new();
        let sub = SubscriptionId::new();
        let event = ProcessedEvent::new("txn_1", "approved", serde_json::json!({}))
            .with_user(user)
            .with_subscription(sub);

        assert_eq!(event.user_id, Some(user));
        assert_eq!(event.subscription_id, Some(sub));
    }
}
