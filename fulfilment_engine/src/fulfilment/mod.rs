//! # The pure fulfilment pipeline
//!
//! The decisions the engine makes about a paid order are plain functions: [`plan_groups`] partitions line items by
//! store, and [`classify`] picks a dispatch strategy from the resulting shape. Persistence and rider assignment
//! happen elsewhere, against the typed outputs produced here. Keeping these stages pure is what makes the grouping
//! and precedence rules unit-testable without a database in sight.
mod classify;
mod grouping;

pub use classify::{classify, DispatchReason, DispatchStrategy};
pub use grouping::{plan_groups, GroupingPlan, SellerBasket};

use serde::{Deserialize, Serialize};

use crate::db_types::Delivery;

/// The outcome of the rider-assignment stage. The source system's "no rider found" case was a silent no-op; here it
/// is a first-class variant so callers and tests can distinguish "assigned" from "nothing happened".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssignmentResult {
    /// A rider was claimed and a delivery record created.
    Assigned { delivery: Delivery },
    /// Direct dispatch was wanted, but no rider is currently available. The order is left untouched and can be
    /// retried once a rider frees up.
    AwaitingRider,
    /// Multi-seller hub consolidation: assignment is deferred until the hub confirms all seller groups are ready.
    Deferred,
}
