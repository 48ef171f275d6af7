//! Coupon evaluation.
//!
//! A coupon discounts only the cart lines belonging to its store. Evaluation
//! is pure and repeatable; coupons are never consumed or marked used, and expiry
//! is enforced by the lookup query.

use serde::Serialize;
use uuid::Uuid;

use super::pricing::{percent_of, CheckoutLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub discount: i64,
    pub discounted_amount: i64,
}

/// Quotes a coupon against the current cart.
///
/// Lines from other stores contribute nothing; a cart with no qualifying
/// line yields a zero quote, which is not an error.
pub fn quote(coupon_store: Uuid, discount_pct: i64, lines: &[CheckoutLine]) -> Quote {
    let applicable: i64 = lines
        .iter()
        .filter(|l| l.store_id == Some(coupon_store))
        .map(CheckoutLine::subtotal)
        .sum();
    let discount = percent_of(applicable, discount_pct);
    Quote {
        discount,
        discounted_amount: applicable - discount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(store: Uuid, price: i64, quantity: u32) -> CheckoutLine {
        CheckoutLine {
            product_id: Uuid::new_v4(),
            store_id: Some(store),
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
    fn discounts_only_the_coupon_store() {
        let s1 = Uuid::new_v4();
        let s2 = Uuid::new_v4();
        let lines = vec![line(s1, 100, 2), line(s2, 50, 1)];

        let q = quote(s1, 10, &lines);
        assert_eq!(q.discount, 20);
        assert_eq!(q.discounted_amount, 180);
    }

    #[test]
    fn no_qualifying_lines_is_zero_not_an_error() {
        let lines = vec![line(Uuid::new_v4(), 100, 1)];
        let q = quote(Uuid::new_v4(), 50, &lines);
        assert_eq!(q.discount, 0);
        assert_eq!(q.discounted_amount, 0);
    }

    #[test]
    fn rounds_half_up() {
        let s1 = Uuid::new_v4();
        // 3% of 333 = 9.99 → 10
        let q = quote(s1, 3, &[line(s1, 333, 1)]);
        assert_eq!(q.discount, 10);
    }

    #[test]
    fn repeat_evaluation_is_stable() {
        let s1 = Uuid::new_v4();
        let lines = vec![line(s1, 75, 4)];
        assert_eq!(quote(s1, 20, &lines), quote(s1, 20, &lines));
    }
}
