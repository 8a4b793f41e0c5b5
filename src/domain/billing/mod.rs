//! Billing domain: provider events, the subscription state machine, and the
//! classifier that routes events between the subscription and one-time paths.

pub mod classifier;
pub mod dunning;
pub mod errors;
pub mod plan;
pub mod provider_event;
pub mod status;
pub mod subscription;
pub mod transition;

pub use classifier::{EventClassifier, EventRoute};
pub use dunning::{DunningStage, GRACE_PERIOD_DAYS};
pub use errors::WebhookError;
pub use plan::Plan;
pub use provider_event::{
    EventCustomer, EventItem, EventKind, EventOrder, EventSubscription, EventTransaction,
    ProviderEvent,
};
pub use status::{BillingCycle, SubscriptionStatus};
pub use subscription::Subscription;
pub use transition::{apply, Transition, TransitionContext, WebhookAction};
