//! Subscription state machine.
//!
//! Pure transition logic: given an event category, the current subscription
//! row (if any), and the classified context, compute the next row to persist
//! or a no-op with a reason. No I/O happens here; persistence and the
//! idempotency ledger are the application layer's concern.

use crate::domain::foundation::{PlanId, SubscriptionId, Timestamp, UserId};

use super::dunning::{DunningStage, GRACE_PERIOD_DAYS};
use super::plan::Plan;
use super::provider_event::{EventKind, EventSubscription};
use super::status::{BillingCycle, SubscriptionStatus};
use super::subscription::Subscription;

/// Action labels returned to the provider in the acknowledgment body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookAction {
    Activated,
    DunningUpdated,
    Cancelled,
    Refunded,
    LogOnly,
    Unknown,
    AlreadyProcessed,
    OneTimeGranted,
    OneTimeRevoked,
}

impl WebhookAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookAction::Activated => "activated",
            WebhookAction::DunningUpdated => "dunning_updated",
            WebhookAction::Cancelled => "cancelled",
            WebhookAction::Refunded => "refunded",
            WebhookAction::LogOnly => "log_only",
            WebhookAction::Unknown => "unknown",
            WebhookAction::AlreadyProcessed => "already_processed",
            WebhookAction::OneTimeGranted => "one_time_granted",
            WebhookAction::OneTimeRevoked => "one_time_revoked",
        }
    }
}

/// Classified inputs the state machine needs besides the current row.
#[derive(Debug, Clone)]
pub struct TransitionContext<'a> {
    pub user_id: UserId,
    pub plan: &'a Plan,
    pub offer_id: Option<&'a str>,
    pub subscription_info: Option<&'a EventSubscription>,
}

/// Outcome of a transition computation.
#[derive(Debug, Clone)]
pub enum Transition {
    /// Persist `next` as the user's subscription row.
    Apply {
        next: Subscription,
        action: WebhookAction,
    },
    /// No state mutation; only the audit record is written.
    NoOp {
        action: WebhookAction,
        reason: String,
    },
}

impl Transition {
    pub fn action(&self) -> WebhookAction {
        match self {
            Transition::Apply { action, .. } => *action,
            Transition::NoOp { action, .. } => *action,
        }
    }
}

/// Computes the next subscription state for a classified event.
///
/// This matches exhaustively over [`EventKind`]; unknown provider strings
/// have already collapsed into `EventKind::Unknown` at the classifier
/// boundary and cannot silently take a mutation path.
pub fn apply(
    kind: EventKind,
    current: Option<&Subscription>,
    ctx: &TransitionContext<'_>,
    now: Timestamp,
) -> Transition {
    match kind {
        EventKind::Sale => activate(current, ctx, now),
        EventKind::PaymentDelayed => escalate_dunning(current, now),
        EventKind::Cancellation => cancel(current, now),
        EventKind::Refund => refund(current, now),
        EventKind::LogOnly => Transition::NoOp {
            action: WebhookAction::LogOnly,
            reason: "recognized effect-free event".to_string(),
        },
        EventKind::Unknown => Transition::NoOp {
            action: WebhookAction::Unknown,
            reason: "unrecognized event type".to_string(),
        },
    }
}

/// Sale/Activation: upsert to a fully active row, resetting dunning and any
/// pending cancellation intent.
fn activate(
    current: Option<&Subscription>,
    ctx: &TransitionContext<'_>,
    now: Timestamp,
) -> Transition {
    let cycle = ctx
        .offer_id
        .map(|offer| ctx.plan.cycle_for_offer(offer))
        .unwrap_or(BillingCycle::Monthly);

    let expires_at = now.add_calendar_months(cycle.period_months());

    let info = ctx.subscription_info;
    // The provider's own next-charge timestamp is authoritative when given.
    let next_billing_date = info
        .and_then(|s| s.next_charge)
        .map(Timestamp::from_datetime)
        .unwrap_or(expires_at);

    let next = Subscription {
        id: current.map(|s| s.id).unwrap_or_else(SubscriptionId::new),
        user_id: ctx.user_id,
        plan_id: ctx.plan.id.clone(),
        status: SubscriptionStatus::Active,
        billing_cycle: Some(cycle),
        dunning_stage: DunningStage::zero(),
        external_subscription_id: info.and_then(|s| s.id.clone()),
        external_offer_id: ctx.offer_id.map(str::to_string),
        starts_at: now,
        expires_at,
        next_billing_date: Some(next_billing_date),
        grace_period_ends_at: None,
        cancel_at_period_end: false,
        canceled_at: None,
        last_payment_attempt: current.and_then(|s| s.last_payment_attempt),
        updated_at: now,
    };

    Transition::Apply {
        next,
        action: WebhookAction::Activated,
    }
}

/// Payment Delayed: bump the dunning stage; stage 3 opens the grace period.
fn escalate_dunning(current: Option<&Subscription>, now: Timestamp) -> Transition {
    let Some(current) = current else {
        return Transition::NoOp {
            action: WebhookAction::LogOnly,
            reason: "payment delayed for user without subscription".to_string(),
        };
    };
    if !current.status.can_escalate_dunning() {
        return Transition::NoOp {
            action: WebhookAction::LogOnly,
            reason: format!(
                "payment delayed ignored in status '{}'",
                current.status.as_str()
            ),
        };
    }

    let stage = current.dunning_stage.escalate();
    let mut next = current.clone();
    next.dunning_stage = stage;
    next.last_payment_attempt = Some(now);
    next.updated_at = now;
    if stage.at_cap() {
        next.status = SubscriptionStatus::GracePeriod;
        next.grace_period_ends_at = Some(now.add_days(GRACE_PERIOD_DAYS));
    } else {
        next.status = SubscriptionStatus::PastDue;
    }

    Transition::Apply {
        next,
        action: WebhookAction::DunningUpdated,
    }
}

/// Cancellation: honor an earlier end-of-period intent, otherwise record one.
fn cancel(current: Option<&Subscription>, now: Timestamp) -> Transition {
    let Some(current) = current else {
        return Transition::NoOp {
            action: WebhookAction::LogOnly,
            reason: "cancellation for user without subscription".to_string(),
        };
    };

    let mut next = current.clone();
    if current.cancel_at_period_end {
        // The user already requested end-of-period cancellation; this event
        // confirms it. Access persists until the period end, so only the
        // confirmation timestamp moves.
        next.canceled_at = Some(now);
    } else {
        next.cancel_at_period_end = true;
        next.canceled_at = Some(now);
    }
    next.updated_at = now;

    Transition::Apply {
        next,
        action: WebhookAction::Cancelled,
    }
}

/// Refund/Chargeback: immediate hard downgrade to the basic sentinel plan.
/// Overrides grace-period protection.
fn refund(current: Option<&Subscription>, now: Timestamp) -> Transition {
    let Some(current) = current else {
        return Transition::NoOp {
            action: WebhookAction::LogOnly,
            reason: "refund for user without subscription".to_string(),
        };
    };

    let mut next = current.clone();
    next.plan_id = PlanId::basic();
    next.status = SubscriptionStatus::Cancelled;
    next.dunning_stage = DunningStage::zero();
    next.external_subscription_id = None;
    next.billing_cycle = None;
    next.next_billing_date = None;
    next.grace_period_ends_at = None;
    next.updated_at = now;

    Transition::Apply {
        next,
        action: WebhookAction::Refunded,
    }
}
