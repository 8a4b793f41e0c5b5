//! Dunning stage value object.

use serde::{Deserialize, Serialize};

/// Days of access preserved once dunning reaches its cap.
pub const GRACE_PERIOD_DAYS: i64 = 7;

/// Count of consecutive payment failures since the last successful charge.
///
/// Saturates at [`DunningStage::MAX`]; reaching the cap opens the grace
/// period instead of escalating further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DunningStage(u8);

impl DunningStage {
    pub const MAX: u8 = 3;

    /// Stage zero: no outstanding failures.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Builds a stage from a raw value, clamping to the cap.
    pub fn from_raw(value: u8) -> Self {
        Self(value.min(Self::MAX))
    }

    /// Next stage after another failed payment, saturating at the cap.
    pub fn escalate(&self) -> Self {
        Self((self.0 + 1).min(Self::MAX))
    }

    /// Returns true if the cap has been reached.
    pub fn at_cap(&self) -> bool {
        self.0 == Self::MAX
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for DunningStage {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalation_ladder_stops_at_cap() {
        let mut stage = DunningStage::zero();
        for expected in [1, 2, 3, 3, 3] {
            stage = stage.escalate();
            assert_eq!(stage.value(), expected);
        }
    }

    #[test]
    fn at_cap_only_at_three() {
        assert!(!DunningStage::from_raw(0).at_cap());
        assert!(!DunningStage::from_raw(2).at_cap());
        assert!(DunningStage::from_raw(3).at_cap());
    }

    #[test]
    fn from_raw_clamps_out_of_range() {
        assert_eq!(DunningStage::from_raw(9).value(), 3);
    }
}
