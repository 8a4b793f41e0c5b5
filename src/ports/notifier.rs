//! BillingNotifier port - fire-and-forget post-transition notifications.

use async_trait::async_trait;

use crate::domain::billing::WebhookAction;
use crate::domain::foundation::UserId;

/// Downstream notification after a successful state transition.
///
/// The webhook path must never block on, or fail because of, notification
/// delivery: `notify` is infallible from the caller's perspective and
/// implementations queue or drop internally.
#[async_trait]
pub trait BillingNotifier: Send + Sync {
    async fn notify(&self, action: WebhookAction, user_id: UserId);
}
