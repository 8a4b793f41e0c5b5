//! Inbound payment-provider webhook event types.
//!
//! Models the provider's JSON payload. Only fields this core consumes are
//! captured; the full payload is preserved verbatim in the idempotency ledger
//! for audit.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw webhook event as delivered by the provider.
///
/// The provider is inconsistent about where it puts things (`status` vs
/// `event`, four possible transaction-hash fields), so accessors normalize.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderEvent {
    /// Event category key, older payload shape.
    #[serde(default)]
    pub status: Option<String>,

    /// Event category key, newer payload shape.
    #[serde(default)]
    pub event: Option<String>,

    /// Shared-secret token when embedded in the payload.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub item: Option<EventItem>,

    #[serde(default)]
    pub customer: Option<EventCustomer>,

    #[serde(default)]
    pub order: Option<EventOrder>,

    #[serde(default)]
    pub transaction: Option<EventTransaction>,

    #[serde(default)]
    pub transaction_id: Option<String>,

    #[serde(default)]
    pub subscriptions: Vec<EventSubscription>,
}

/// Purchased item: offer id routes subscriptions, product id routes
/// one-time purchases.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventItem {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub offer_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventCustomer {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventOrder {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventTransaction {
    #[serde(default)]
    pub hash: Option<String>,
}

/// Provider-side subscription sub-object (`subscriptions[0]`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventSubscription {
    #[serde(default)]
    pub id: Option<String>,
    /// Provider-supplied next charge timestamp (RFC 3339). Authoritative
    /// over the locally computed next billing date when present.
    #[serde(default)]
    pub next_charge: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub change_card_url: Option<String>,
    #[serde(default)]
    pub successful_charges: Option<u32>,
    #[serde(default)]
    pub failed_charges: Option<u32>,
}

impl ProviderEvent {
    /// The raw event category key (`status` wins over `event` when both are
    /// present, matching the provider's older payloads).
    pub fn raw_kind(&self) -> Option<&str> {
        self.status.as_deref().or(self.event.as_deref())
    }

    /// Resolves the idempotency key: first non-empty of `order.hash`,
    /// `transaction.hash`, `order.transaction_hash`, `transaction_id`;
    /// otherwise a generated fallback so even unkeyed events are ledgered.
    pub fn transaction_id(&self) -> String {
        let candidates = [
            self.order.as_ref().and_then(|o| o.hash.as_deref()),
            self.transaction.as_ref().and_then(|t| t.hash.as_deref()),
            self.order.as_ref().and_then(|o| o.transaction_hash.as_deref()),
            self.transaction_id.as_deref(),
        ];
        for candidate in candidates.into_iter().flatten() {
            if !candidate.trim().is_empty() {
                return candidate.to_string();
            }
        }
        format!("generated-{}", Uuid::new_v4())
    }

    /// Customer email, if present.
    pub fn customer_email(&self) -> Option<&str> {
        self.customer.as_ref().and_then(|c| c.email.as_deref())
    }

    /// Offer id from the purchased item.
    pub fn offer_id(&self) -> Option<&str> {
        self.item.as_ref().and_then(|i| i.offer_id.as_deref())
    }

    /// Product id from the purchased item.
    pub fn product_id(&self) -> Option<&str> {
        self.item.as_ref().and_then(|i| i.product_id.as_deref())
    }

    /// The first provider-side subscription sub-object, if any.
    pub fn subscription_info(&self) -> Option<&EventSubscription> {
        self.subscriptions.first()
    }

    /// Classifies the raw event key into the closed [`EventKind`] enum.
    pub fn kind(&self) -> EventKind {
        match self.raw_kind() {
            Some(raw) => EventKind::from_raw(raw),
            None => EventKind::Unknown,
        }
    }
}

/// Closed set of event categories the state machine understands.
///
/// Produced once at the classifier boundary; everything downstream matches
/// exhaustively on this enum rather than on raw provider strings, so a new
/// or misspelled provider event name surfaces as `Unknown` in exactly one
/// place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Successful sale: activate or renew the subscription.
    Sale,
    /// Recurring charge failed; escalate dunning.
    PaymentDelayed,
    /// Cancellation intent or confirmation.
    Cancellation,
    /// Refund or chargeback: immediate hard downgrade.
    Refund,
    /// Recognized but effect-free; audit record only.
    LogOnly,
    /// Anything else. Logged with a warning classification.
    Unknown,
}

impl EventKind {
    /// Maps a raw provider event key to a category.
    ///
    /// Keys are normalized (lowercased, `-` folded to `_`) because the
    /// provider has shipped both spellings.
    pub fn from_raw(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "paid" | "completed" | "approved" | "authorized" | "purchase_approved" => {
                EventKind::Sale
            }
            "subscription_delayed" => EventKind::PaymentDelayed,
            "subscription_canceled" | "subscription_cancelled" => EventKind::Cancellation,
            "refunded" | "chargedback" => EventKind::Refund,
            "trial_started" | "trial_ended" | "extended" | "card_exchanged" | "uncanceled"
            | "all_charges_paid" | "waiting_payment" | "payment_pending" => EventKind::LogOnly,
            _ => EventKind::Unknown,
        }
    }
}
