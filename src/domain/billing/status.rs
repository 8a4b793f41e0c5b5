//! Subscription status and billing cycle enums.
//!
//! Statuses follow the payment lifecycle driven by the provider's webhook
//! stream: activation, dunning escalation, grace period, cancellation.

use serde::{Deserialize, Serialize};

/// Current state of a user's subscription in the billing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid and current. Full access.
    Active,

    /// One or two consecutive payment failures. Access retained while the
    /// provider retries the charge.
    PastDue,

    /// Dunning reached its cap; a bounded window before hard cancellation.
    /// Access retained until `grace_period_ends_at`.
    GracePeriod,

    /// Subscription ended (refund, chargeback, or confirmed cancellation).
    Cancelled,
}

impl SubscriptionStatus {
    /// Returns true if this status keeps paid access alive.
    pub fn has_access(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active
                | SubscriptionStatus::PastDue
                | SubscriptionStatus::GracePeriod
        )
    }

    /// Returns true if a payment-delayed event may escalate dunning from
    /// this status.
    pub fn can_escalate_dunning(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active
                | SubscriptionStatus::PastDue
                | SubscriptionStatus::GracePeriod
        )
    }

    /// Stable string form used in storage and responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::GracePeriod => "grace_period",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

/// Length of the billing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Annual,
}

impl BillingCycle {
    /// Billing-period length in calendar months.
    pub fn period_months(&self) -> u32 {
        match self {
            BillingCycle::Monthly => 1,
            BillingCycle::Annual => 12,
        }
    }

    /// Stable string form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Annual => "annual",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_has_access() {
        assert!(SubscriptionStatus::Active.has_access());
    }

    #[test]
    fn past_due_retains_access() {
        assert!(SubscriptionStatus::PastDue.has_access());
    }

    #[test]
    fn grace_period_retains_access() {
        assert!(SubscriptionStatus::GracePeriod.has_access());
    }

    #[test]
    fn cancelled_has_no_access() {
        assert!(!SubscriptionStatus::Cancelled.has_access());
    }

    #[test]
    fn cancelled_cannot_escalate_dunning() {
        assert!(!SubscriptionStatus::Cancelled.can_escalate_dunning());
        assert!(SubscriptionStatus::Active.can_escalate_dunning());
        assert!(SubscriptionStatus::PastDue.can_escalate_dunning());
        assert!(SubscriptionStatus::GracePeriod.can_escalate_dunning());
    }

    #[test]
    fn status_string_forms_are_stable() {
        assert_eq!(SubscriptionStatus::Active.as_str(), "active");
        assert_eq!(SubscriptionStatus::PastDue.as_str(), "past_due");
        assert_eq!(SubscriptionStatus::GracePeriod.as_str(), "grace_period");
        assert_eq!(SubscriptionStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn billing_cycle_period_lengths() {
        assert_eq!(BillingCycle::Monthly.period_months(), 1);
        assert_eq!(BillingCycle::Annual.period_months(), 12);
    }
}
