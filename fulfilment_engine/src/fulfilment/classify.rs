use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Why a direct dispatch was chosen. Both reasons execute identically; the distinction only matters for logging and
/// downstream analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchReason {
    /// The order contains food, which cannot sit at a consolidation hub.
    FoodPriority,
    /// All items come from a single store.
    SingleSeller,
}

/// The delivery strategy for a newly-paid order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchStrategy {
    /// Immediate single-rider assignment.
    Direct(DispatchReason),
    /// Multi-seller order: park it as `Processing` and defer rider assignment until the hub confirms every seller
    /// group is packed and ready.
    HubConsolidation,
}

impl Display for DispatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchStrategy::Direct(DispatchReason::FoodPriority) => write!(f, "direct dispatch (food priority)"),
            DispatchStrategy::Direct(DispatchReason::SingleSeller) => write!(f, "direct dispatch (single seller)"),
            DispatchStrategy::HubConsolidation => write!(f, "hub consolidation"),
        }
    }
}

/// Decide the delivery strategy for a grouped, paid order.
///
/// The rules are mutually exclusive and checked in precedence order: food orders are always dispatched directly,
/// regardless of how many sellers are involved, because hub consolidation would spoil the product. Otherwise a
/// single-seller order goes straight to a rider, and anything spanning more than one store is routed through the hub.
pub fn classify(is_food_order: bool, group_count: usize) -> DispatchStrategy {
    if is_food_order {
        DispatchStrategy::Direct(DispatchReason::FoodPriority)
    } else if group_count <= 1 {
        DispatchStrategy::Direct(DispatchReason::SingleSeller)
    } else {
        DispatchStrategy::HubConsolidation
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn food_overrides_seller_count() {
        assert_eq!(classify(true, 1), DispatchStrategy::Direct(DispatchReason::FoodPriority));
        assert_eq!(classify(true, 2), DispatchStrategy::Direct(DispatchReason::FoodPriority));
        assert_eq!(classify(true, 5), DispatchStrategy::Direct(DispatchReason::FoodPriority));
    }

    #[test]
    fn single_seller_goes_direct() {
        assert_eq!(classify(false, 1), DispatchStrategy::Direct(DispatchReason::SingleSeller));
    }

    #[test]
    fn multi_seller_goes_to_hub() {
        assert_eq!(classify(false, 2), DispatchStrategy::HubConsolidation);
        assert_eq!(classify(false, 7), DispatchStrategy::HubConsolidation);
    }
}
