//! ProcessWebhookHandler - command handler for inbound payment provider
//! webhooks.
//!
//! The pipeline is: classify the event against the plan and product
//! catalogs, resolve the customer to a user, compute the state transition,
//! claim the idempotency ledger row, then persist. Claiming the ledger row
//! before the subscription write means that under concurrent duplicate
//! deliveries exactly one request applies the state change; the losers
//! observe [`RecordOutcome::Duplicate`] and acknowledge without touching
//! the store.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::billing::{
    apply, EventClassifier, EventKind, EventRoute, Plan, ProviderEvent, Transition,
    TransitionContext, WebhookAction, WebhookError,
};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{
    BillingNotifier, IdentityResolver, PlanCatalog, ProcessedEvent, ProcessedEventStore,
    ProductCatalog, RecordOutcome, SubscriptionStore,
};

use super::one_time_purchase::OneTimePurchaseHandler;

/// How many times a failed subscription write is retried before the event
/// is acknowledged anyway. The ledger row already exists at that point, so
/// redelivery cannot repair it; operators recover from the audit record.
const UPSERT_ATTEMPTS: u32 = 3;

/// Handler for processing payment provider webhooks.
pub struct ProcessWebhookHandler {
    subscriptions: Arc<dyn SubscriptionStore>,
    processed_events: Arc<dyn ProcessedEventStore>,
    plan_catalog: Arc<dyn PlanCatalog>,
    product_catalog: Arc<dyn ProductCatalog>,
    identity_resolver: Arc<dyn IdentityResolver>,
    notifier: Arc<dyn BillingNotifier>,
    one_time: Arc<OneTimePurchaseHandler>,
}

impl ProcessWebhookHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        processed_events: Arc<dyn ProcessedEventStore>,
        plan_catalog: Arc<dyn PlanCatalog>,
        product_catalog: Arc<dyn ProductCatalog>,
        identity_resolver: Arc<dyn IdentityResolver>,
        notifier: Arc<dyn BillingNotifier>,
        one_time: Arc<OneTimePurchaseHandler>,
    ) -> Self {
        Self {
            subscriptions,
            processed_events,
            plan_catalog,
            product_catalog,
            identity_resolver,
            notifier,
            one_time,
        }
    }

    pub async fn handle(&self, event: ProviderEvent) -> Result<WebhookAction, WebhookError> {
        let classifier =
            EventClassifier::new(self.plan_catalog.as_ref(), self.product_catalog.as_ref());

        match classifier.classify(&event).await? {
            EventRoute::Subscription {
                plan,
                matched_offer_id,
            } => self.handle_subscription(&event, &plan, &matched_offer_id).await,
            EventRoute::OneTimePurchase { product } => {
                self.one_time.handle(&event, &product).await
            }
            EventRoute::Unmatched => {
                warn!(
                    offer_id = ?event.offer_id(),
                    product_id = ?event.product_id(),
                    raw = ?event.raw_kind(),
                    "no plan or product matched, acknowledging"
                );
                Ok(WebhookAction::Unknown)
            }
        }
    }

    async fn handle_subscription(
        &self,
        event: &ProviderEvent,
        plan: &Plan,
        matched_offer_id: &str,
    ) -> Result<WebhookAction, WebhookError> {
        let kind = event.kind();

        if kind == EventKind::Unknown {
            warn!(raw = ?event.raw_kind(), "unrecognized event type, acknowledging");
            return Ok(WebhookAction::Unknown);
        }
        if kind == EventKind::LogOnly {
            return self.record_log_only(event).await;
        }

        let user_id = self.resolve_user(event).await?;

        let transaction_id = event.transaction_id();
        let raw_kind = event.raw_kind().unwrap_or("unknown").to_string();

        // Fast path; the atomic claim below remains the correctness boundary.
        if self
            .processed_events
            .is_processed(&transaction_id, &raw_kind)
            .await?
        {
            debug!(%transaction_id, event_type = %raw_kind, "duplicate delivery ignored");
            return Ok(WebhookAction::AlreadyProcessed);
        }

        let current = self.subscriptions.find_by_user(&user_id).await?;
        let ctx = TransitionContext {
            user_id,
            plan,
            offer_id: Some(matched_offer_id),
            subscription_info: event.subscription_info(),
        };
        let transition = apply(kind, current.as_ref(), &ctx, Timestamp::now());

        let payload = serde_json::to_value(event).unwrap_or(serde_json::Value::Null);
        let mut record =
            ProcessedEvent::new(&transaction_id, &raw_kind, payload).with_user(user_id);
        if let Transition::Apply { next, .. } = &transition {
            record = record.with_subscription(next.id);
        }
        if self.processed_events.record(record).await? == RecordOutcome::Duplicate {
            debug!(%transaction_id, event_type = %raw_kind, "lost duplicate race, skipping");
            return Ok(WebhookAction::AlreadyProcessed);
        }

        match transition {
            Transition::Apply { next, action } => {
                self.upsert_with_retry(&next, &transaction_id).await?;
                info!(
                    %user_id,
                    plan_id = %next.plan_id,
                    status = next.status.as_str(),
                    action = action.as_str(),
                    "subscription updated"
                );
                self.notifier.notify(action, user_id).await;
                Ok(action)
            }
            Transition::NoOp { action, reason } => {
                debug!(%user_id, action = action.as_str(), %reason, "no state change");
                Ok(action)
            }
        }
    }

    /// Effect-free events (`trial_started`, `waiting_payment`, card swaps)
    /// mutate nothing but still leave a ledger row for audit. The customer
    /// lookup is best effort: an event without a resolvable user is
    /// recorded without linkage rather than rejected.
    async fn record_log_only(&self, event: &ProviderEvent) -> Result<WebhookAction, WebhookError> {
        let transaction_id = event.transaction_id();
        let raw_kind = event.raw_kind().unwrap_or("unknown").to_string();
        let payload = serde_json::to_value(event).unwrap_or(serde_json::Value::Null);

        let mut record = ProcessedEvent::new(&transaction_id, &raw_kind, payload);
        if let Ok(user_id) = self.resolve_user(event).await {
            record = record.with_user(user_id);
        }
        if self.processed_events.record(record).await? == RecordOutcome::Duplicate {
            debug!(%transaction_id, event_type = %raw_kind, "duplicate delivery ignored");
            return Ok(WebhookAction::AlreadyProcessed);
        }
        debug!(%transaction_id, event_type = %raw_kind, "effect-free event recorded");
        Ok(WebhookAction::LogOnly)
    }

    async fn resolve_user(&self, event: &ProviderEvent) -> Result<UserId, WebhookError> {
        let email = event
            .customer_email()
            .ok_or_else(|| WebhookError::UnresolvedIdentity("<missing email>".to_string()))?;
        self.identity_resolver
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| WebhookError::UnresolvedIdentity(email.to_string()))
    }

    /// The ledger row is already claimed when this runs, so a lost write
    /// here cannot be repaired by provider redelivery. Retry a few times,
    /// then log loudly and give up; the full payload is in the ledger.
    async fn upsert_with_retry(
        &self,
        next: &crate::domain::billing::Subscription,
        transaction_id: &str,
    ) -> Result<(), WebhookError> {
        let mut last_err = None;
        for attempt in 1..=UPSERT_ATTEMPTS {
            match self.subscriptions.upsert(next).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(%transaction_id, attempt, error = %err, "subscription write failed");
                    last_err = Some(err);
                }
            }
        }
        let err = last_err.map(WebhookError::from).unwrap_or_else(|| {
            WebhookError::Persistence("subscription write failed".to_string())
        });
        tracing::error!(
            %transaction_id,
            user_id = %next.user_id,
            "subscription write failed after retries; ledger row retained for recovery"
        );
        Err(err)
    }
}
