//! PostgreSQL implementation of SubscriptionStore.
//!
//! One row per user, enforced by a unique index on `user_id`. All writes go
//! through a single upsert keyed on that index, so concurrent writers
//! last-write-win on the whole row instead of interleaving columns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{BillingCycle, DunningStage, Subscription, SubscriptionStatus};
use crate::domain::foundation::{DomainError, PlanId, SubscriptionId, Timestamp, UserId};
use crate::ports::SubscriptionStore;

/// PostgreSQL implementation of the SubscriptionStore port.
pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    plan_id: String,
    status: String,
    billing_cycle: Option<String>,
    dunning_stage: i16,
    external_subscription_id: Option<String>,
    external_offer_id: Option<String>,
    starts_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    next_billing_date: Option<DateTime<Utc>>,
    grace_period_ends_at: Option<DateTime<Utc>>,
    cancel_at_period_end: bool,
    canceled_at: Option<DateTime<Utc>>,
    last_payment_attempt: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status = parse_status(&row.status)?;
        let billing_cycle = row.billing_cycle.as_deref().map(parse_cycle).transpose()?;
        let plan_id = PlanId::new(&row.plan_id)?;

        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            plan_id,
            status,
            billing_cycle,
            dunning_stage: DunningStage::from_raw(u8::try_from(row.dunning_stage).unwrap_or(0)),
            external_subscription_id: row.external_subscription_id,
            external_offer_id: row.external_offer_id,
            starts_at: Timestamp::from_datetime(row.starts_at),
            expires_at: Timestamp::from_datetime(row.expires_at),
            next_billing_date: row.next_billing_date.map(Timestamp::from_datetime),
            grace_period_ends_at: row.grace_period_ends_at.map(Timestamp::from_datetime),
            cancel_at_period_end: row.cancel_at_period_end,
            canceled_at: row.canceled_at.map(Timestamp::from_datetime),
            last_payment_attempt: row.last_payment_attempt.map(Timestamp::from_datetime),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    match s {
        "active" => Ok(SubscriptionStatus::Active),
        "past_due" => Ok(SubscriptionStatus::PastDue),
        "grace_period" => Ok(SubscriptionStatus::GracePeriod),
        "cancelled" => Ok(SubscriptionStatus::Cancelled),
        _ => Err(DomainError::database(format!("Invalid status value: {}", s))),
    }
}

fn parse_cycle(s: &str) -> Result<BillingCycle, DomainError> {
    match s {
        "monthly" => Ok(BillingCycle::Monthly),
        "annual" => Ok(BillingCycle::Annual),
        _ => Err(DomainError::database(format!(
            "Invalid billing_cycle value: {}",
            s
        ))),
    }
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, plan_id, status, billing_cycle, dunning_stage,
                   external_subscription_id, external_offer_id, starts_at, expires_at,
                   next_billing_date, grace_period_ends_at, cancel_at_period_end,
                   canceled_at, last_payment_attempt, updated_at
            FROM subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find subscription: {}", e)))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn upsert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, plan_id, status, billing_cycle, dunning_stage,
                external_subscription_id, external_offer_id, starts_at, expires_at,
                next_billing_date, grace_period_ends_at, cancel_at_period_end,
                canceled_at, last_payment_attempt, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (user_id) DO UPDATE SET
                plan_id = EXCLUDED.plan_id,
                status = EXCLUDED.status,
                billing_cycle = EXCLUDED.billing_cycle,
                dunning_stage = EXCLUDED.dunning_stage,
                external_subscription_id = EXCLUDED.external_subscription_id,
                external_offer_id = EXCLUDED.external_offer_id,
                starts_at = EXCLUDED.starts_at,
                expires_at = EXCLUDED.expires_at,
                next_billing_date = EXCLUDED.next_billing_date,
                grace_period_ends_at = EXCLUDED.grace_period_ends_at,
                cancel_at_period_end = EXCLUDED.cancel_at_period_end,
                canceled_at = EXCLUDED.canceled_at,
                last_payment_attempt = EXCLUDED.last_payment_attempt,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_uuid())
        .bind(subscription.plan_id.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.billing_cycle.map(|c| c.as_str()))
        .bind(i16::from(subscription.dunning_stage.value()))
        .bind(&subscription.external_subscription_id)
        .bind(&subscription.external_offer_id)
        .bind(subscription.starts_at.as_datetime())
        .bind(subscription.expires_at.as_datetime())
        .bind(subscription.next_billing_date.map(|t| *t.as_datetime()))
        .bind(subscription.grace_period_ends_at.map(|t| *t.as_datetime()))
        .bind(subscription.cancel_at_period_end)
        .bind(subscription.canceled_at.map(|t| *t.as_datetime()))
        .bind(subscription.last_payment_attempt.map(|t| *t.as_datetime()))
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to upsert subscription: {}", e)))?;

        Ok(())
    }
}
