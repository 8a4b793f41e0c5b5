//! In-memory port implementations for tests.
//!
//! These mirror the Postgres adapters' observable behavior, including the
//! ledger's first-writer-wins duplicate handling, so handler and router
//! tests can run without a database.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::billing::{Plan, Subscription};
use crate::domain::foundation::{DomainError, Timestamp, UserId};

use super::{
    EntitlementStore, IdentityResolver, PlanCatalog, ProcessedEvent, ProcessedEventStore,
    Product, ProductCatalog, RecordOutcome, SubscriptionStore,
};

/// Subscription store backed by a `HashMap` keyed on user id.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    rows: Mutex<HashMap<UserId, Subscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscription(subscription: Subscription) -> Self {
        let store = Self::new();
        store
            .rows
            .lock()
            .unwrap()
            .insert(subscription.user_id, subscription);
        store
    }

    pub fn get(&self, user_id: &UserId) -> Option<Subscription> {
        self.rows.lock().unwrap().get(user_id).cloned()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        Ok(self.rows.lock().unwrap().get(user_id).cloned())
    }

    async fn upsert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        self.rows
            .lock()
            .unwrap()
            .insert(subscription.user_id, subscription.clone());
        Ok(())
    }
}

/// Idempotency ledger keyed on `(transaction_id, event_type)`.
#[derive(Default)]
pub struct InMemoryProcessedEventStore {
    rows: Mutex<HashMap<(String, String), ProcessedEvent>>,
}

impl InMemoryProcessedEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, transaction_id: &str, event_type: &str) -> Option<ProcessedEvent> {
        let key = (transaction_id.to_string(), event_type.to_string());
        self.rows.lock().unwrap().get(&key).cloned()
    }
}

#[async_trait]
impl ProcessedEventStore for InMemoryProcessedEventStore {
    async fn is_processed(
        &self,
        transaction_id: &str,
        event_type: &str,
    ) -> Result<bool, DomainError> {
        let key = (transaction_id.to_string(), event_type.to_string());
        Ok(self.rows.lock().unwrap().contains_key(&key))
    }

    async fn record(&self, event: ProcessedEvent) -> Result<RecordOutcome, DomainError> {
        let key = (event.transaction_id.clone(), event.event_type.clone());
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&key) {
            return Ok(RecordOutcome::Duplicate);
        }
        rows.insert(key, event);
        Ok(RecordOutcome::Recorded)
    }

    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|_, event| !event.processed_at.is_before(&cutoff));
        Ok((before - rows.len()) as u64)
    }
}

/// Plan catalog over a fixed plan list.
#[derive(Default)]
pub struct InMemoryPlanCatalog {
    plans: Vec<Plan>,
}

impl InMemoryPlanCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plans(plans: Vec<Plan>) -> Self {
        Self { plans }
    }
}

#[async_trait]
impl PlanCatalog for InMemoryPlanCatalog {
    async fn find_by_offer_id(&self, offer_id: &str) -> Result<Option<Plan>, DomainError> {
        Ok(self.plans.iter().find(|p| p.matches_offer(offer_id)).cloned())
    }
}

/// Product catalog over a fixed product list.
#[derive(Default)]
pub struct InMemoryProductCatalog {
    products: Vec<Product>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn find_by_product_id(
        &self,
        product_id: &str,
    ) -> Result<Option<Product>, DomainError> {
        Ok(self
            .products
            .iter()
            .find(|p| p.product_id == product_id)
            .cloned())
    }
}

/// Identity resolver over a fixed email-to-user mapping.
#[derive(Default)]
pub struct StaticIdentityResolver {
    users: HashMap<String, UserId>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(email: &str, user_id: UserId) -> Self {
        let mut users = HashMap::new();
        users.insert(email.to_lowercase(), user_id);
        Self { users }
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserId>, DomainError> {
        Ok(self.users.get(&email.to_lowercase()).copied())
    }
}

/// Entitlement store backed by a `HashSet`.
#[derive(Default)]
pub struct InMemoryEntitlementStore {
    grants: Mutex<HashSet<(UserId, String)>>,
}

impl InMemoryEntitlementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, user_id: &UserId, product_id: &str) -> bool {
        self.grants
            .lock()
            .unwrap()
            .contains(&(*user_id, product_id.to_string()))
    }

    pub fn grant_sync(&self, user_id: &UserId, product_id: &str) {
        self.grants
            .lock()
            .unwrap()
            .insert((*user_id, product_id.to_string()));
    }
}

#[async_trait]
impl EntitlementStore for InMemoryEntitlementStore {
    async fn grant(&self, user_id: &UserId, product_id: &str) -> Result<(), DomainError> {
        self.grants
            .lock()
            .unwrap()
            .insert((*user_id, product_id.to_string()));
        Ok(())
    }

    async fn revoke(&self, user_id: &UserId, product_id: &str) -> Result<(), DomainError> {
        self.grants
            .lock()
            .unwrap()
            .remove(&(*user_id, product_id.to_string()));
        Ok(())
    }
}
