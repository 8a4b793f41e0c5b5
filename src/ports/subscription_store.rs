//! SubscriptionStore port - durable storage for subscription rows.

use async_trait::async_trait;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, UserId};

/// Port for the one-row-per-user subscription store.
///
/// All mutations are whole-row upserts keyed on `user_id`. Implementations
/// must make the upsert atomic at the storage layer (a transaction or native
/// upsert), never a read-modify-write of individual columns, so two
/// concurrent handlers cannot interleave partial updates.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Find the subscription row for a user, if one exists.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError>;

    /// Insert or replace the user's subscription row.
    async fn upsert(&self, subscription: &Subscription) -> Result<(), DomainError>;
}
