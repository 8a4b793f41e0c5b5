//! Shared domain primitives (value objects, ids, errors).

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{PlanId, SubscriptionId, UserId};
pub use timestamp::Timestamp;
