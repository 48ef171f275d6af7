//! Order lifecycle: statuses, payment fields, and who may move what where.
//!
//! Vendors may write any status onto their own orders. Couriers follow a
//! strict machine: pick a pending unassigned order, walk it to delivery, or
//! hand it back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Confirmed,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Confirmed => "confirmed",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// `delivered` admits no further transition by anyone.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Whether a courier holding an order in `self` may move it to `to`.
    ///
    /// Hand-back to `pending` or `cancelled` releases the order; the caller
    /// must also clear the assignment and pickup timestamp.
    pub fn courier_can_move(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Confirmed, OutForDelivery)
                | (Confirmed | OutForDelivery, Delivered)
                | (Confirmed | OutForDelivery, Cancelled)
                | (Confirmed | OutForDelivery, Pending)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "confirmed" => Ok(Self::Confirmed),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    // Aliases accept the wire spelling used by older clients.
    #[default]
    #[serde(alias = "COD")]
    Cod,
    #[serde(alias = "Stripe")]
    Stripe,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cod => "cod",
            Self::Stripe => "stripe",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl StoreStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for StoreStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;
    use super::*;

    #[test]
    fn status_round_trip() {
        for s in [
            Pending,
            Processing,
            Shipped,
            Confirmed,
            OutForDelivery,
            Delivered,
            Cancelled,
        ] {
            assert_eq!(s.as_str().parse::<OrderStatus>(), Ok(s));
        }
        assert!("sideways".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn courier_walks_forward() {
        assert!(Confirmed.courier_can_move(OutForDelivery));
        assert!(Confirmed.courier_can_move(Delivered));
        assert!(OutForDelivery.courier_can_move(Delivered));
    }

    #[test]
    fn courier_hand_back() {
        assert!(Confirmed.courier_can_move(Pending));
        assert!(Confirmed.courier_can_move(Cancelled));
        assert!(OutForDelivery.courier_can_move(Pending));
        assert!(OutForDelivery.courier_can_move(Cancelled));
    }

    #[test]
    fn courier_cannot_skip_or_resurrect() {
        // Picking is a separate compare-and-set, not a status move.
        assert!(!Pending.courier_can_move(Confirmed));
        assert!(!Pending.courier_can_move(Delivered));
        assert!(!Delivered.courier_can_move(Pending));
        assert!(!Delivered.courier_can_move(OutForDelivery));
        assert!(!Cancelled.courier_can_move(Delivered));
        assert!(!OutForDelivery.courier_can_move(Confirmed));
    }

    #[test]
    fn delivered_is_terminal() {
        assert!(Delivered.is_terminal());
        assert!(!Cancelled.is_terminal());
    }
}
