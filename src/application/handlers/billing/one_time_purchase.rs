//! OneTimePurchaseHandler - grants and revokes entitlements for events that
//! matched the one-time product catalog rather than a subscription plan.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::billing::{EventKind, ProviderEvent, WebhookAction, WebhookError};
use crate::ports::{
    BillingNotifier, EntitlementStore, IdentityResolver, ProcessedEvent, ProcessedEventStore,
    Product, RecordOutcome,
};

/// Handler for the one-time purchase path.
///
/// A sale grants the product's entitlement; a refund or chargeback revokes
/// it. Both writes are idempotent, and the ledger row is claimed before the
/// entitlement write so a concurrent duplicate delivery applies the effect
/// at most once.
pub struct OneTimePurchaseHandler {
    processed_events: Arc<dyn ProcessedEventStore>,
    identity_resolver: Arc<dyn IdentityResolver>,
    entitlements: Arc<dyn EntitlementStore>,
    notifier: Arc<dyn BillingNotifier>,
}

impl OneTimePurchaseHandler {
    pub fn new(
        processed_events: Arc<dyn ProcessedEventStore>,
        identity_resolver: Arc<dyn IdentityResolver>,
        entitlements: Arc<dyn EntitlementStore>,
        notifier: Arc<dyn BillingNotifier>,
    ) -> Self {
        Self {
            processed_events,
            identity_resolver,
            entitlements,
            notifier,
        }
    }

    pub async fn handle(
        &self,
        event: &ProviderEvent,
        product: &Product,
    ) -> Result<WebhookAction, WebhookError> {
        let kind = event.kind();
        let action = match kind {
            EventKind::Sale => WebhookAction::OneTimeGranted,
            EventKind::Refund => WebhookAction::OneTimeRevoked,
            _ => {
                debug!(
                    product_id = %product.product_id,
                    raw = ?event.raw_kind(),
                    "one-time product event carries no entitlement effect"
                );
                return self.record_log_only(event).await;
            }
        };

        let email = event
            .customer_email()
            .ok_or_else(|| WebhookError::UnresolvedIdentity("<missing email>".to_string()))?;
        let user_id = self
            .identity_resolver
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| WebhookError::UnresolvedIdentity(email.to_string()))?;

        let transaction_id = event.transaction_id();
        let raw_kind = event.raw_kind().unwrap_or("unknown").to_string();

        if self
            .processed_events
            .is_processed(&transaction_id, &raw_kind)
            .await?
        {
            debug!(%transaction_id, event_type = %raw_kind, "duplicate one-time event ignored");
            return Ok(WebhookAction::AlreadyProcessed);
        }

        // Claim the ledger row first; the loser of a concurrent race must not
        // re-apply the entitlement write.
        let payload = serde_json::to_value(event).unwrap_or(serde_json::Value::Null);
        let record =
            ProcessedEvent::new(&transaction_id, &raw_kind, payload).with_user(user_id);
        if self.processed_events.record(record).await? == RecordOutcome::Duplicate {
            debug!(%transaction_id, event_type = %raw_kind, "lost duplicate race, skipping");
            return Ok(WebhookAction::AlreadyProcessed);
        }

        match action {
            WebhookAction::OneTimeGranted => {
                self.entitlements.grant(&user_id, &product.product_id).await?;
                info!(%user_id, product_id = %product.product_id, "entitlement granted");
            }
            WebhookAction::OneTimeRevoked => {
                self.entitlements.revoke(&user_id, &product.product_id).await?;
                warn!(%user_id, product_id = %product.product_id, "entitlement revoked");
            }
            _ => unreachable!("action is fixed to grant or revoke above"),
        }

        self.notifier.notify(action, user_id).await;

        Ok(action)
    }

    /// Effect-free events on a one-time product mutate no entitlement but
    /// still leave a ledger row for audit. User linkage is best effort.
    async fn record_log_only(&self, event: &ProviderEvent) -> Result<WebhookAction, WebhookError> {
        let transaction_id = event.transaction_id();
        let raw_kind = event.raw_kind().unwrap_or("unknown").to_string();
        let payload = serde_json::to_value(event).unwrap_or(serde_json::Value::Null);

        let mut record = ProcessedEvent::new(&transaction_id, &raw_kind, payload);
        if let Some(email) = event.customer_email() {
            if let Ok(Some(user_id)) = self.identity_resolver.find_user_by_email(email).await {
                record = record.with_user(user_id);
            }
        }
        if self.processed_events.record(record).await? == RecordOutcome::Duplicate {
            debug!(%transaction_id, event_type = %raw_kind, "duplicate one-time event ignored");
            return Ok(WebhookAction::AlreadyProcessed);
        }
        Ok(WebhookAction::LogOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::provider_event::testing::ProviderEventBuilder;
    use crate::domain::foundation::UserId;
    use crate::ports::testing::{
        InMemoryEntitlementStore, InMemoryProcessedEventStore, StaticIdentityResolver,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingNotifier {
        sent: Mutex<Vec<(WebhookAction, UserId)>>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BillingNotifier for RecordingNotifier {
        async fn notify(&self, action: WebhookAction, user_id: UserId) {
            self.sent.lock().unwrap().push((action, user_id));
        }
    }

    fn product() -> Product {
        Product {
            id: "report-pack".to_string(),
            product_id: "prod_report".to_string(),
        }
    }

    fn handler(
        user_id: UserId,
    ) -> (
        OneTimePurchaseHandler,
        Arc<InMemoryEntitlementStore>,
        Arc<InMemoryProcessedEventStore>,
    ) {
        let entitlements = Arc::new(InMemoryEntitlementStore::new());
        let processed = Arc::new(InMemoryProcessedEventStore::new());
        let handler = OneTimePurchaseHandler::new(
            processed.clone(),
            Arc::new(StaticIdentityResolver::single("buyer@example.com", user_id)),
            entitlements.clone(),
            Arc::new(RecordingNotifier::new()),
        );
        (handler, entitlements, processed)
    }

    #[tokio::test]
    async fn sale_grants_entitlement() {
        let user_id = UserId::new();
        let (handler, entitlements, _) = handler(user_id);

        let event = ProviderEventBuilder::new("approved")
            .transaction_id("txn_ot_1")
            .customer_email("buyer@example.com")
            .product_id("prod_report")
            .build();

        let action = handler.handle(&event, &product()).await.unwrap();

        assert_eq!(action, WebhookAction::OneTimeGranted);
        assert!(entitlements.has(&user_id, "prod_report"));
    }

    #[tokio::test]
    async fn refund_revokes_entitlement() {
        let user_id = UserId::new();
        let (handler, entitlements, _) = handler(user_id);
        entitlements.grant_sync(&user_id, "prod_report");

        let event = ProviderEventBuilder::new("refunded")
            .transaction_id("txn_ot_2")
            .customer_email("buyer@example.com")
            .product_id("prod_report")
            .build();

        let action = handler.handle(&event, &product()).await.unwrap();

        assert_eq!(action, WebhookAction::OneTimeRevoked);
        assert!(!entitlements.has(&user_id, "prod_report"));
    }

    #[tokio::test]
    async fn duplicate_sale_grants_once() {
        let user_id = UserId::new();
        let (handler, entitlements, processed) = handler(user_id);

        let event = ProviderEventBuilder::new("approved")
            .transaction_id("txn_ot_3")
            .customer_email("buyer@example.com")
            .product_id("prod_report")
            .build();

        let first = handler.handle(&event, &product()).await.unwrap();
        let second = handler.handle(&event, &product()).await.unwrap();

        assert_eq!(first, WebhookAction::OneTimeGranted);
        assert_eq!(second, WebhookAction::AlreadyProcessed);
        assert!(entitlements.has(&user_id, "prod_report"));
        assert_eq!(processed.len(), 1);
    }

    #[tokio::test]
    async fn non_sale_event_is_log_only() {
        let user_id = UserId::new();
        let (handler, _, processed) = handler(user_id);

        let event = ProviderEventBuilder::new("waiting_payment")
            .transaction_id("txn_ot_4")
            .customer_email("buyer@example.com")
            .product_id("prod_report")
            .build();

        let action = handler.handle(&event, &product()).await.unwrap();

        assert_eq!(action, WebhookAction::LogOnly);
        let row = processed.get("txn_ot_4", "waiting_payment").unwrap();
        assert_eq!(row.user_id, Some(user_id));
    }

    #[tokio::test]
    async fn unknown_email_is_unresolved_identity() {
        let user_id = UserId::new();
        let (handler, _, _) = handler(user_id);

        let event = ProviderEventBuilder::new("approved")
            .transaction_id("txn_ot_5")
            .customer_email("stranger@example.com")
            .product_id("prod_report")
            .build();

        let err = handler.handle(&event, &product()).await.unwrap_err();
        assert!(matches!(err, WebhookError::UnresolvedIdentity(_)));
        assert!(!err.is_surfaced());
    }
}
