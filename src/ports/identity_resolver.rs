//! IdentityResolver port - maps customer emails to internal user ids.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};

/// Read-only lookup from an event's customer email to the internal user.
///
/// Emails are matched case-insensitively by implementations. A miss is not
/// an error at this boundary; the caller decides how to classify it.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserId>, DomainError>;
}
