//! Event classifier - routes an inbound event to the subscription path or
//! the one-time-purchase path.
//!
//! An event targets the subscription path when its `offer_id` or
//! `product_id` matches a plan's monthly or annual offer identifier in the
//! plan catalog. Otherwise the product catalog is consulted for a one-time
//! purchase. A subscription match always wins when an event carries both a
//! subscription-eligible offer id and a one-time product id.

use crate::domain::foundation::DomainError;
use crate::ports::{PlanCatalog, Product, ProductCatalog};

use super::plan::Plan;
use super::provider_event::ProviderEvent;

/// Where an event is routed after catalog matching.
#[derive(Debug, Clone)]
pub enum EventRoute {
    /// Offer matched a plan: drive the subscription state machine.
    Subscription {
        plan: Plan,
        /// The identifier that matched; decides monthly vs annual.
        matched_offer_id: String,
    },
    /// Product matched the one-time catalog.
    OneTimePurchase { product: Product },
    /// Neither catalog matched.
    Unmatched,
}

/// Classifies events against the plan and product catalogs.
pub struct EventClassifier<'a> {
    plan_catalog: &'a dyn PlanCatalog,
    product_catalog: &'a dyn ProductCatalog,
}

impl<'a> EventClassifier<'a> {
    pub fn new(
        plan_catalog: &'a dyn PlanCatalog,
        product_catalog: &'a dyn ProductCatalog,
    ) -> Self {
        Self {
            plan_catalog,
            product_catalog,
        }
    }

    /// Resolves the route for an event.
    ///
    /// Both `offer_id` and `product_id` are tried against the plan catalog
    /// (the provider has put the offer identifier in either field), in that
    /// order, before falling back to the one-time product catalog.
    pub async fn classify(&self, event: &ProviderEvent) -> Result<EventRoute, DomainError> {
        for candidate in [event.offer_id(), event.product_id()].into_iter().flatten() {
            if let Some(plan) = self.plan_catalog.find_by_offer_id(candidate).await? {
                return Ok(EventRoute::Subscription {
                    plan,
                    matched_offer_id: candidate.to_string(),
                });
            }
        }

        if let Some(product_id) = event.product_id() {
            if let Some(product) = self.product_catalog.find_by_product_id(product_id).await? {
                return Ok(EventRoute::OneTimePurchase { product });
            }
        }

        Ok(EventRoute::Unmatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::provider_event::testing::ProviderEventBuilder;
    use crate::domain::foundation::PlanId;
    use async_trait::async_trait;

    struct FixedPlanCatalog {
        plans: Vec<Plan>,
    }

    #[async_trait]
    impl PlanCatalog for FixedPlanCatalog {
        async fn find_by_offer_id(&self, offer_id: &str) -> Result<Option<Plan>, DomainError> {
            Ok(self.plans.iter().find(|p| p.matches_offer(offer_id)).cloned())
        }
    }

    struct FixedProductCatalog {
        products: Vec<Product>,
    }

    #[async_trait]
    impl ProductCatalog for FixedProductCatalog {
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

    fn catalogs() -> (FixedPlanCatalog, FixedProductCatalog) {
        let plans = FixedPlanCatalog {
            plans: vec![Plan {
                id: PlanId::new("pro").unwrap(),
                offer_id_monthly: Some("offer_month".to_string()),
                offer_id_annual: Some("offer_year".to_string()),
            }],
        };
        let products = FixedProductCatalog {
            products: vec![Product {
                id: "report-pack".to_string(),
                product_id: "prod_report".to_string(),
            }],
        };
        (plans, products)
    }

    #[tokio::test]
    async fn offer_id_match_routes_to_subscription() {
        let (plans, products) = catalogs();
        let classifier = EventClassifier::new(&plans, &products);
        let event = ProviderEventBuilder::new("approved").offer_id("offer_month").build();

        let route = classifier.classify(&event).await.unwrap();

        match route {
            EventRoute::Subscription {
                plan,
                matched_offer_id,
            } => {
                assert_eq!(plan.id.as_str(), "pro");
                assert_eq!(matched_offer_id, "offer_month");
            }
            other => panic!("expected subscription route, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn product_id_can_also_match_a_plan_offer() {
        let (plans, products) = catalogs();
        let classifier = EventClassifier::new(&plans, &products);
        let event = ProviderEventBuilder::new("approved").product_id("offer_year").build();

        let route = classifier.classify(&event).await.unwrap();
        assert!(matches!(route, EventRoute::Subscription { .. }));
    }

    #[tokio::test]
    async fn subscription_match_wins_over_one_time_product() {
        let (plans, products) = catalogs();
        let classifier = EventClassifier::new(&plans, &products);
        let event = ProviderEventBuilder::new("approved")
            .offer_id("offer_month")
            .product_id("prod_report")
            .build();

        let route = classifier.classify(&event).await.unwrap();
        assert!(matches!(route, EventRoute::Subscription { .. }));
    }

    #[tokio::test]
    async fn unmatched_offer_falls_back_to_one_time_path() {
        let (plans, products) = catalogs();
        let classifier = EventClassifier::new(&plans, &products);
        let event = ProviderEventBuilder::new("approved")
            .offer_id("offer_nope")
            .product_id("prod_report")
            .build();

        let route = classifier.classify(&event).await.unwrap();
        match route {
            EventRoute::OneTimePurchase { product } => {
                assert_eq!(product.id, "report-pack");
            }
            other => panic!("expected one-time route, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn nothing_matched_is_unmatched() {
        let (plans, products) = catalogs();
        let classifier = EventClassifier::new(&plans, &products);
        let event = ProviderEventBuilder::new("approved").offer_id("offer_nope").build();

        let route = classifier.classify(&event).await.unwrap();
        assert!(matches!(route, EventRoute::Unmatched));
    }

    #[tokio::test]
    async fn event_without_item_is_unmatched() {
        let (plans, products) = catalogs();
        let classifier = EventClassifier::new(&plans, &products);
        let event = ProviderEventBuilder::new("approved").build();

        let route = classifier.classify(&event).await.unwrap();
        assert!(matches!(route, EventRoute::Unmatched));
    }
}
