//! Queue-backed notifier.
//!
//! Webhook processing must acknowledge quickly, so notifications are pushed
//! onto an unbounded channel and drained by a background task. A closed or
//! lagging consumer never fails the webhook; the notification is logged and
//! dropped.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::billing::WebhookAction;
use crate::domain::foundation::UserId;
use crate::ports::BillingNotifier;

/// A billing notification queued for downstream delivery.
#[derive(Debug, Clone)]
pub struct BillingNotification {
    pub action: WebhookAction,
    pub user_id: UserId,
}

/// Fire-and-forget notifier backed by a tokio mpsc channel.
pub struct QueuedNotifier {
    tx: mpsc::UnboundedSender<BillingNotification>,
}

impl QueuedNotifier {
    /// Creates the notifier and spawns the drain task.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(drain(rx));
        Self { tx }
    }

    /// Creates the notifier with an external receiver, for tests and for
    /// wiring a real downstream consumer.
    pub fn with_channel() -> (Self, mpsc::UnboundedReceiver<BillingNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

async fn drain(mut rx: mpsc::UnboundedReceiver<BillingNotification>) {
    while let Some(notification) = rx.recv().await {
        info!(
            user_id = %notification.user_id,
            action = notification.action.as_str(),
            "billing notification"
        );
    }
}

#[async_trait]
impl BillingNotifier for QueuedNotifier {
    async fn notify(&self, action: WebhookAction, user_id: UserId) {
        let notification = BillingNotification { action, user_id };
        if self.tx.send(notification).is_err() {
            warn!(%user_id, action = action.as_str(), "notification channel closed, dropping");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notifications_arrive_in_order() {
        let (notifier, mut rx) = QueuedNotifier::with_channel();
        let user_id = UserId::new();

        notifier.notify(WebhookAction::Activated, user_id).await;
        notifier.notify(WebhookAction::Cancelled, user_id).await;

        assert_eq!(rx.recv().await.unwrap().action, WebhookAction::Activated);
        assert_eq!(rx.recv().await.unwrap().action, WebhookAction::Cancelled);
    }

    #[tokio::test]
    async fn closed_channel_does_not_fail_notify() {
        let (notifier, rx) = QueuedNotifier::with_channel();
        drop(rx);

        // Must not panic or error.
        notifier.notify(WebhookAction::Refunded, UserId::new()).await;
    }
}
