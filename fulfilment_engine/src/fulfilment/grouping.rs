use log::trace;
use mkt_common::Money;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{OrderId, OrderLine},
    traits::FulfilmentError,
};

/// One store's slice of an order, before it has been persisted as a [`crate::db_types::SellerGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerBasket {
    pub store_id: i64,
    pub seller_id: i64,
    /// Row ids of the order lines that belong to this basket, in order of appearance.
    pub item_ids: Vec<i64>,
    /// Sum of `unit_price × quantity` over the basket's lines.
    pub subtotal: Money,
}

/// The output of the grouping stage: one basket per distinct store, plus the order-level food flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingPlan {
    pub order_id: OrderId,
    pub baskets: Vec<SellerBasket>,
    /// True iff any line's store is food-flagged. A single food item makes the entire order a food order; there is no
    /// per-item or majority rule.
    pub is_food_order: bool,
}

impl GroupingPlan {
    pub fn group_count(&self) -> usize {
        self.baskets.len()
    }

    /// The order's item-level subtotal, excluding shipping.
    pub fn order_subtotal(&self) -> Money {
        self.baskets.iter().map(|b| b.subtotal).sum()
    }
}

/// Partition an order's lines by owning store.
///
/// Baskets are produced in first-occurrence order, each line lands in exactly one basket, and each basket's subtotal
/// is the sum of its lines' totals. An order with zero lines must never reach this stage; encountering one is fatal
/// for the order's processing, not something to skip silently.
pub fn plan_groups(order_id: &OrderId, lines: &[OrderLine]) -> Result<GroupingPlan, FulfilmentError> {
    if lines.is_empty() {
        return Err(FulfilmentError::EmptyOrder(order_id.clone()));
    }
    let mut baskets: Vec<SellerBasket> = Vec::new();
    let mut is_food_order = false;
    for line in lines {
        is_food_order |= line.store_is_food;
        match baskets.iter_mut().find(|b| b.store_id == line.store_id) {
            Some(basket) => {
                basket.item_ids.push(line.id);
                basket.subtotal += line.line_total();
            },
            None => baskets.push(SellerBasket {
                store_id: line.store_id,
                seller_id: line.seller_id,
                item_ids: vec![line.id],
                subtotal: line.line_total(),
            }),
        }
    }
    trace!(
        "📦️ Order {order_id}: {} lines split into {} seller baskets (food order: {is_food_order})",
        lines.len(),
        baskets.len()
    );
    Ok(GroupingPlan { order_id: order_id.clone(), baskets, is_food_order })
}

#[cfg(test)]
mod test {
    use super::*;

    fn line(id: i64, store_id: i64, seller_id: i64, price: i64, qty: i64, food: bool) -> OrderLine {
        OrderLine {
            id,
            order_id: "ord-1".parse().unwrap(),
            product_id: id * 10,
            variant_id: None,
            quantity: qty,
            unit_price: Money::from_cents(price),
            seller_group_id: None,
            store_id,
            seller_id,
            store_is_food: food,
        }
    }

    #[test]
    fn empty_order_is_fatal() {
        let oid: OrderId = "ord-1".parse().unwrap();
        let err = plan_groups(&oid, &[]).unwrap_err();
        assert!(matches!(err, FulfilmentError::EmptyOrder(_)));
    }

    #[test]
    fn one_basket_per_store_in_first_occurrence_order() {
        let oid: OrderId = "ord-1".parse().unwrap();
        let lines = vec![
            line(1, 7, 70, 1000, 1, false),
            line(2, 3, 30, 500, 2, false),
            line(3, 7, 70, 250, 4, false),
        ];
        let plan = plan_groups(&oid, &lines).unwrap();
        assert_eq!(plan.group_count(), 2);
        assert_eq!(plan.baskets[0].store_id, 7);
        assert_eq!(plan.baskets[0].item_ids, vec![1, 3]);
        assert_eq!(plan.baskets[0].subtotal, Money::from_cents(2000));
        assert_eq!(plan.baskets[1].store_id, 3);
        assert_eq!(plan.baskets[1].item_ids, vec![2]);
        assert_eq!(plan.baskets[1].subtotal, Money::from_cents(1000));
        assert!(!plan.is_food_order);
        // every line lands in exactly one basket
        let mut all_ids: Vec<i64> = plan.baskets.iter().flat_map(|b| b.item_ids.clone()).collect();
        all_ids.sort_unstable();
        assert_eq!(all_ids, vec![1, 2, 3]);
    }

    #[test]
    fn subtotals_sum_to_order_subtotal() {
        let oid: OrderId = "ord-1".parse().unwrap();
        let lines = vec![line(1, 1, 10, 2000, 2, false), line(2, 2, 20, 1500, 1, true)];
        let plan = plan_groups(&oid, &lines).unwrap();
        assert_eq!(plan.baskets[0].subtotal, Money::from_cents(4000));
        assert_eq!(plan.baskets[1].subtotal, Money::from_cents(1500));
        assert_eq!(plan.order_subtotal(), Money::from_cents(5500));
    }

    #[test]
    fn single_food_line_flags_whole_order() {
        let oid: OrderId = "ord-1".parse().unwrap();
        let lines = vec![
            line(1, 1, 10, 100, 1, false),
            line(2, 2, 20, 100, 1, true),
            line(3, 3, 30, 100, 1, false),
        ];
        let plan = plan_groups(&oid, &lines).unwrap();
        assert!(plan.is_food_order);
    }
}
