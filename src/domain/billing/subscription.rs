//! The durable subscription record, one row per user.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PlanId, SubscriptionId, Timestamp, UserId};

use super::dunning::DunningStage;
use super::status::{BillingCycle, SubscriptionStatus};

/// One durable billing record per user.
///
/// Invariant: exactly one row exists per `user_id` at any time. All mutations
/// are whole-row upserts keyed on `user_id`; the row is never deleted --
/// refund and chargeback degrade it to the `basic` sentinel plan so audit
/// continuity is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub status: SubscriptionStatus,
    pub billing_cycle: Option<BillingCycle>,
    pub dunning_stage: DunningStage,
    pub external_subscription_id: Option<String>,
    pub external_offer_id: Option<String>,
    pub starts_at: Timestamp,
    /// Hard access cutoff.
    pub expires_at: Timestamp,
    pub next_billing_date: Option<Timestamp>,
    /// Set only once dunning reaches its cap.
    pub grace_period_ends_at: Option<Timestamp>,
    /// True once a cancellation intent exists but access is not yet revoked.
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<Timestamp>,
    pub last_payment_attempt: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Returns true if the record currently grants paid access.
    pub fn has_access(&self, now: Timestamp) -> bool {
        self.status.has_access() && !now.is_after(&self.expires_at)
    }
}
