//! Billing plan records from the plan catalog.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::PlanId;

use super::status::BillingCycle;

/// A priced plan as known to the plan catalog.
///
/// Each plan carries the provider-side offer identifiers for its monthly and
/// annual variants. The catalog is read-only from this core's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub offer_id_monthly: Option<String>,
    pub offer_id_annual: Option<String>,
}

impl Plan {
    /// Determines the billing cycle an offer id buys on this plan.
    ///
    /// An offer id equal to the plan's annual offer id yields `Annual`;
    /// any other matched offer id yields `Monthly`.
    pub fn cycle_for_offer(&self, offer_id: &str) -> BillingCycle {
        if self.offer_id_annual.as_deref() == Some(offer_id) {
            BillingCycle::Annual
        } else {
            BillingCycle::Monthly
        }
    }

    /// Returns true if either variant's offer id matches.
    pub fn matches_offer(&self, offer_id: &str) -> bool {
        self.offer_id_monthly.as_deref() == Some(offer_id)
            || self.offer_id_annual.as_deref() == Some(offer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pro_plan() -> Plan {
        Plan {
            id: PlanId::new("pro").unwrap(),
            offer_id_monthly: Some("offer_month".to_string()),
            offer_id_annual: Some("offer_year".to_string()),
        }
    }

    #[test]
    fn annual_offer_yields_annual_cycle() {
        assert_eq!(pro_plan().cycle_for_offer("offer_year"), BillingCycle::Annual);
    }

    #[test]
    fn monthly_offer_yields_monthly_cycle() {
        assert_eq!(pro_plan().cycle_for_offer("offer_month"), BillingCycle::Monthly);
    }

    #[test]
    fn unknown_offer_defaults_to_monthly_cycle() {
        // cycle_for_offer is only called after a catalog match; an id that
        // matched but is not the annual one is the monthly variant.
        assert_eq!(pro_plan().cycle_for_offer("other"), BillingCycle::Monthly);
    }

    #[test]
    fn matches_either_variant() {
        let plan = pro_plan();
        assert!(plan.matches_offer("offer_month"));
        assert!(plan.matches_offer("offer_year"));
        assert!(!plan.matches_offer("offer_nope"));
    }
}
