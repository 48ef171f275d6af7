//! Order lifecycle events, published to the bus when one is configured.

use serde::Serialize;
use uuid::Uuid;

use super::order::OrderStatus;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Created {
        order_id: Uuid,
        store_id: Option<Uuid>,
        final_amount: i64,
        multi_store: bool,
    },
    StatusChanged {
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    },
    Picked {
        order_id: Uuid,
        delivery_man_id: Uuid,
    },
    Delivered {
        order_id: Uuid,
        delivery_man_id: Uuid,
    },
}

impl OrderEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Created { .. } => "vendora.orders.created",
            Self::StatusChanged { .. } => "vendora.orders.status",
            Self::Picked { .. } => "vendora.orders.picked",
            Self::Delivered { .. } => "vendora.orders.delivered",
        }
    }
}
