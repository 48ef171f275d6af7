//! Order decomposition and pricing.
//!
//! A checkout cart may span several vendor stores. The planner partitions the
//! lines by store (first-encounter order), prices each group, allocates the
//! single cart-level delivery charge across the groups, and, for more than
//! one store, adds an umbrella parent order carrying the grand totals.
//!
//! Everything here is pure; the orders route persists a [`Plan`] inside one
//! database transaction.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{OrderItem, VariationPick};

/// Rounds `amount * pct / 100` half-up. Amounts are minor units.
pub fn percent_of(amount: i64, pct: i64) -> i64 {
    (amount * pct + 50) / 100
}

/// One incoming checkout line, as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub product_id: Uuid,
    #[serde(default)]
    pub store_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub quantity: u32,
    pub price: i64,
    #[serde(default)]
    pub variation: Option<VariationPick>,
    #[serde(default)]
    pub discounted_price: Option<i64>,
    #[serde(default)]
    pub coupon_applied: bool,
}

impl CheckoutLine {
    pub fn subtotal(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }

    /// Discount carried by this line once a coupon has been placed on it.
    pub fn discount(&self) -> i64 {
        if !self.coupon_applied {
            return 0;
        }
        match self.discounted_price {
            Some(d) => (self.price - d) * i64::from(self.quantity),
            None => 0,
        }
    }

    fn into_order_item(self) -> OrderItem {
        OrderItem {
            product_id: self.product_id,
            name: self.name,
            image: self.image,
            quantity: self.quantity,
            price: self.price,
            variation: self.variation,
            discounted_price: self.discounted_price,
            coupon_applied: self.coupon_applied,
        }
    }
}

/// How the cart-level delivery charge is split across sub-orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChargeAllocation {
    /// Legacy behavior: the first store group carries the whole charge.
    #[default]
    FirstStore,
    /// Split by group subtotal; rounding remainder goes to the first group.
    Proportional,
}

impl FromStr for ChargeAllocation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "first_store" => Ok(Self::FirstStore),
            "proportional" => Ok(Self::Proportional),
            _ => Err(()),
        }
    }
}

/// How a coupon discount is written onto the qualifying lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscountPlacement {
    /// Legacy behavior: the whole discount lands on the single most
    /// expensive qualifying line (by line subtotal).
    #[default]
    Concentrate,
    /// Every qualifying line is discounted by the coupon percentage.
    Proportional,
}

impl FromStr for DiscountPlacement {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "concentrate" => Ok(Self::Concentrate),
            "proportional" => Ok(Self::Proportional),
            _ => Err(()),
        }
    }
}

/// Writes a coupon's discount onto the lines belonging to its store.
///
/// Any previously placed discount is cleared first, so placement is
/// idempotent per checkout. Lines of other stores are never touched.
pub fn place_discount(
    lines: &mut [CheckoutLine],
    coupon_store: Uuid,
    discount_pct: i64,
    placement: DiscountPlacement,
) {
    for line in lines.iter_mut() {
        line.discounted_price = None;
        line.coupon_applied = false;
    }

    let qualifying: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.store_id == Some(coupon_store))
        .map(|(i, _)| i)
        .collect();
    if qualifying.is_empty() {
        return;
    }

    match placement {
        DiscountPlacement::Concentrate => {
            let applicable: i64 = qualifying.iter().map(|&i| lines[i].subtotal()).sum();
            let discount = percent_of(applicable, discount_pct);
            // Priciest line by subtotal; ties go to the earliest line.
            let target = qualifying
                .iter()
                .copied()
                .max_by_key(|&i| (lines[i].subtotal(), std::cmp::Reverse(i)))
                .unwrap_or(qualifying[0]);
            let line = &mut lines[target];
            let unit_off = ((discount + i64::from(line.quantity) / 2) / i64::from(line.quantity))
                .min(line.price);
            line.discounted_price = Some(line.price - unit_off);
            line.coupon_applied = true;
        }
        DiscountPlacement::Proportional => {
            for &i in &qualifying {
                let line = &mut lines[i];
                line.discounted_price = Some(line.price - percent_of(line.price, discount_pct));
                line.coupon_applied = true;
            }
        }
    }
}

/// Splits the cart-level delivery charge over the store groups.
///
/// Always sums exactly to `charge`.
pub fn allocate_charge(charge: i64, subtotals: &[i64], policy: ChargeAllocation) -> Vec<i64> {
    if subtotals.is_empty() {
        return vec![];
    }
    match policy {
        ChargeAllocation::FirstStore => {
            let mut shares = vec![0; subtotals.len()];
            shares[0] = charge;
            shares
        }
        ChargeAllocation::Proportional => {
            let total: i64 = subtotals.iter().sum();
            if total == 0 {
                let mut shares = vec![0; subtotals.len()];
                shares[0] = charge;
                return shares;
            }
            let mut shares: Vec<i64> = subtotals.iter().map(|s| charge * s / total).collect();
            let remainder = charge - shares.iter().sum::<i64>();
            shares[0] += remainder;
            shares
        }
    }
}

/// A planned sub-order for one store.
#[derive(Debug, Clone)]
pub struct StoreDraft {
    pub store_id: Uuid,
    pub items: Vec<OrderItem>,
    pub total_price: i64,
    pub total_discount: i64,
    pub delivery_charge: i64,
    pub final_amount: i64,
}

/// The full decomposition of one checkout.
#[derive(Debug, Clone)]
pub struct Plan {
    pub stores: Vec<StoreDraft>,
    /// Lines whose store could not be resolved; surfaced to the caller
    /// instead of being silently dropped.
    pub skipped: Vec<CheckoutLine>,
    pub grand_total: i64,
    pub grand_discount: i64,
    pub delivery_charge: i64,
}

impl Plan {
    /// More than one store means an umbrella parent order is created.
    pub fn needs_parent(&self) -> bool {
        self.stores.len() > 1
    }

    pub fn parent_final_amount(&self) -> i64 {
        self.grand_total - self.grand_discount + self.delivery_charge
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("no valid items in cart")]
    NoValidItems,
}

/// Decomposes checkout lines into per-store drafts.
pub fn plan(
    lines: Vec<CheckoutLine>,
    delivery_charge: i64,
    allocation: ChargeAllocation,
) -> Result<Plan, PlanError> {
    let mut skipped = Vec::new();
    let mut groups: Vec<(Uuid, Vec<CheckoutLine>)> = Vec::new();

    for line in lines {
        match line.store_id {
            Some(store_id) => match groups.iter_mut().find(|(id, _)| *id == store_id) {
                Some((_, group)) => group.push(line),
                None => groups.push((store_id, vec![line])),
            },
            None => skipped.push(line),
        }
    }

    if groups.is_empty() {
        return Err(PlanError::NoValidItems);
    }

    let subtotals: Vec<i64> = groups
        .iter()
        .map(|(_, g)| g.iter().map(CheckoutLine::subtotal).sum())
        .collect();
    let charges = allocate_charge(delivery_charge, &subtotals, allocation);

    let mut stores = Vec::with_capacity(groups.len());
    for (((store_id, group), total_price), charge) in
        groups.into_iter().zip(subtotals).zip(charges)
    {
        let total_discount: i64 = group.iter().map(CheckoutLine::discount).sum();
        stores.push(StoreDraft {
            store_id,
            total_price,
            total_discount,
            delivery_charge: charge,
            final_amount: total_price - total_discount + charge,
            items: group.into_iter().map(CheckoutLine::into_order_item).collect(),
        });
    }

    let grand_total = stores.iter().map(|s| s.total_price).sum();
    let grand_discount = stores.iter().map(|s| s.total_discount).sum();

    Ok(Plan {
        stores,
        skipped,
        grand_total,
        grand_discount,
        delivery_charge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(store: Option<Uuid>, price: i64, quantity: u32) -> CheckoutLine {
        CheckoutLine {
            product_id: Uuid::new_v4(),
            store_id: store,
            name: "item".into(),
            image: String::new(),
            quantity,
            price,
            variation: None,
            discounted_price: None,
            coupon_applied: false,
        }
    }

    #[test]
    fn single_store_has_no_parent() {
        let s1 = Uuid::new_v4();
        let plan = plan(
            vec![line(Some(s1), 100, 2)],
            30,
            ChargeAllocation::FirstStore,
        )
        .unwrap();
        assert!(!plan.needs_parent());
        assert_eq!(plan.stores.len(), 1);
        assert_eq!(plan.stores[0].final_amount, 230);
    }

    #[test]
    fn multi_store_example_scenario() {
        // Cart: S1 100×2 with a 10% coupon, S2 50×1, delivery 30.
        let s1 = Uuid::new_v4();
        let s2 = Uuid::new_v4();
        let mut lines = vec![line(Some(s1), 100, 2), line(Some(s2), 50, 1)];
        place_discount(&mut lines, s1, 10, DiscountPlacement::Concentrate);

        let plan = plan(lines, 30, ChargeAllocation::FirstStore).unwrap();
        assert!(plan.needs_parent());
        assert_eq!(plan.stores.len(), 2);

        let first = &plan.stores[0];
        assert_eq!(first.store_id, s1);
        assert_eq!(first.total_price, 200);
        assert_eq!(first.total_discount, 20);
        assert_eq!(first.delivery_charge, 30);
        assert_eq!(first.final_amount, 210);

        let second = &plan.stores[1];
        assert_eq!(second.store_id, s2);
        assert_eq!(second.total_discount, 0);
        assert_eq!(second.delivery_charge, 0);
        assert_eq!(second.final_amount, 50);

        assert_eq!(plan.parent_final_amount(), 200 + 50 - 20 + 30);
        assert_eq!(
            plan.stores.iter().map(|s| s.final_amount).sum::<i64>(),
            plan.parent_final_amount()
        );
    }

    #[test]
    fn groups_keep_first_encounter_order() {
        let s1 = Uuid::new_v4();
        let s2 = Uuid::new_v4();
        let lines = vec![
            line(Some(s2), 10, 1),
            line(Some(s1), 20, 1),
            line(Some(s2), 30, 1),
        ];
        let plan = plan(lines, 15, ChargeAllocation::FirstStore).unwrap();
        assert_eq!(plan.stores[0].store_id, s2);
        assert_eq!(plan.stores[0].items.len(), 2);
        assert_eq!(plan.stores[0].delivery_charge, 15);
        assert_eq!(plan.stores[1].delivery_charge, 0);
    }

    #[test]
    fn storeless_lines_are_surfaced_not_silently_dropped() {
        let s1 = Uuid::new_v4();
        let plan = plan(
            vec![line(Some(s1), 10, 1), line(None, 99, 1)],
            0,
            ChargeAllocation::FirstStore,
        )
        .unwrap();
        assert_eq!(plan.stores.len(), 1);
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].price, 99);
    }

    #[test]
    fn all_storeless_fails_cleanly() {
        let err = plan(vec![line(None, 10, 1)], 0, ChargeAllocation::FirstStore).unwrap_err();
        assert_eq!(err, PlanError::NoValidItems);
    }

    #[test]
    fn proportional_charge_sums_exactly() {
        // 100 split over subtotals 1/1/1 cannot divide evenly.
        let shares = allocate_charge(100, &[10, 10, 10], ChargeAllocation::Proportional);
        assert_eq!(shares.iter().sum::<i64>(), 100);
        assert_eq!(shares, vec![34, 33, 33]);

        let shares = allocate_charge(90, &[200, 100], ChargeAllocation::Proportional);
        assert_eq!(shares, vec![60, 30]);
    }

    #[test]
    fn concentrate_places_whole_discount_on_priciest_line() {
        let s1 = Uuid::new_v4();
        let mut lines = vec![line(Some(s1), 40, 1), line(Some(s1), 100, 2)];
        place_discount(&mut lines, s1, 10, DiscountPlacement::Concentrate);

        assert!(!lines[0].coupon_applied);
        assert!(lines[1].coupon_applied);
        // applicable 240, 10% → 24, spread over qty 2 → 12/unit.
        assert_eq!(lines[1].discounted_price, Some(88));
        assert_eq!(lines[1].discount(), 24);
    }

    #[test]
    fn proportional_placement_discounts_every_qualifying_line() {
        let s1 = Uuid::new_v4();
        let s2 = Uuid::new_v4();
        let mut lines = vec![
            line(Some(s1), 100, 1),
            line(Some(s1), 60, 2),
            line(Some(s2), 500, 1),
        ];
        place_discount(&mut lines, s1, 25, DiscountPlacement::Proportional);

        assert_eq!(lines[0].discounted_price, Some(75));
        assert_eq!(lines[1].discounted_price, Some(45));
        assert!(!lines[2].coupon_applied, "other store's line untouched");
    }

    #[test]
    fn placement_is_idempotent() {
        let s1 = Uuid::new_v4();
        let mut lines = vec![line(Some(s1), 100, 1)];
        place_discount(&mut lines, s1, 10, DiscountPlacement::Concentrate);
        place_discount(&mut lines, s1, 10, DiscountPlacement::Concentrate);
        assert_eq!(lines[0].discounted_price, Some(90));
        assert_eq!(lines[0].discount(), 10);
    }

    #[test]
    fn discount_never_exceeds_line_price() {
        let s1 = Uuid::new_v4();
        // 100% coupon on the only line: unit price floors at zero.
        let mut lines = vec![line(Some(s1), 10, 1)];
        place_discount(&mut lines, s1, 100, DiscountPlacement::Concentrate);
        assert_eq!(lines[0].discounted_price, Some(0));
    }

    #[test]
    fn coupon_for_absent_store_is_a_no_op() {
        let s1 = Uuid::new_v4();
        let mut lines = vec![line(Some(s1), 100, 1)];
        place_discount(&mut lines, Uuid::new_v4(), 50, DiscountPlacement::Concentrate);
        assert!(!lines[0].coupon_applied);
        assert_eq!(lines[0].discount(), 0);
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(percent_of(199, 10), 20);
        assert_eq!(percent_of(194, 10), 19);
        assert_eq!(percent_of(195, 10), 20);
        assert_eq!(percent_of(0, 50), 0);
    }

    #[test]
    fn final_amount_invariant_holds_for_every_draft() {
        let s1 = Uuid::new_v4();
        let s2 = Uuid::new_v4();
        let mut lines = vec![
            line(Some(s1), 333, 3),
            line(Some(s2), 77, 2),
            line(Some(s1), 41, 1),
        ];
        place_discount(&mut lines, s1, 7, DiscountPlacement::Proportional);
        let plan = plan(lines, 55, ChargeAllocation::Proportional).unwrap();
        for draft in &plan.stores {
            assert_eq!(
                draft.final_amount,
                draft.total_price - draft.total_discount + draft.delivery_charge
            );
        }
        assert_eq!(
            plan.stores.iter().map(|s| s.delivery_charge).sum::<i64>(),
            55
        );
    }
}
