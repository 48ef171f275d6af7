//! Courier workflow: browse available orders, pick, progress, hand back.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{Role, Session};
use crate::domain::events::OrderEvent;
use crate::domain::order::OrderStatus;
use crate::error::{ApiError, ApiResult};
use crate::models::{DeliveryMan, Order};
use crate::AppState;

/// Resolves the calling courier and refuses deactivated accounts.
async fn active_courier(db: &sqlx::PgPool, session: &Session) -> ApiResult<DeliveryMan> {
    session.require(Role::Delivery)?;
    let courier = sqlx::query_as::<_, DeliveryMan>("SELECT * FROM delivery_men WHERE id = $1")
        .bind(session.user_id)
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    if !courier.is_active {
        return Err(ApiError::Forbidden("courier account is inactive".into()));
    }
    Ok(courier)
}

/// Orders any courier may pick: pending, unassigned, and never a parent.
/// Umbrella orders are receipts, not shippable units. Oldest first.
pub async fn available(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Order>>> {
    active_courier(&state.db, &session).await?;
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders \
         WHERE order_status = 'pending' AND delivery_man_id IS NULL AND NOT is_parent \
         ORDER BY created_at ASC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
pub struct PickRequest {
    pub order_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct PickResponse {
    pub success: bool,
    pub message: String,
    pub order: Order,
}

/// Claims an order. The availability predicate is re-checked in the UPDATE
/// itself, so two couriers racing for the same order cannot both win: the
/// second write matches zero rows.
pub async fn pick(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<PickRequest>,
) -> ApiResult<Json<PickResponse>> {
    let courier = active_courier(&state.db, &session).await?;

    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders \
         SET delivery_man_id = $1, order_status = 'confirmed', picked_at = NOW(), updated_at = NOW() \
         WHERE id = $2 AND order_status = 'pending' AND delivery_man_id IS NULL AND NOT is_parent \
         RETURNING *",
    )
    .bind(courier.id)
    .bind(req.order_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("order not available".into()))?;

    tracing::info!(order_id = %order.id, courier = %courier.id, "order picked");
    state
        .publish(&OrderEvent::Picked {
            order_id: order.id,
            delivery_man_id: courier.id,
        })
        .await;

    Ok(Json(PickResponse {
        success: true,
        message: "order picked successfully".into(),
        order,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub order_id: Uuid,
    pub status: String,
}

/// Moves an assigned order along the courier machine.
///
/// Delivery stamps the timestamp and bumps the courier's completed counter;
/// hand-back (`pending`/`cancelled`) clears the assignment and pickup stamp
/// so the order becomes available again. Both run in one transaction.
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let courier = active_courier(&state.db, &session).await?;

    let order = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE id = $1 AND delivery_man_id = $2",
    )
    .bind(req.order_id)
    .bind(courier.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("order not found".into()))?;

    let to: OrderStatus = req
        .status
        .parse()
        .map_err(|_| ApiError::BadRequest("unknown order status".into()))?;
    let from: OrderStatus = order
        .order_status
        .parse()
        .map_err(|_| ApiError::Conflict("order is in an unknown state".into()))?;
    if !from.courier_can_move(to) {
        return Err(ApiError::BadRequest(format!(
            "cannot move order from {from} to {to}"
        )));
    }

    let mut tx = state.db.begin().await?;
    let updated = match to {
        OrderStatus::Delivered => {
            let updated = sqlx::query_as::<_, Order>(
                "UPDATE orders SET order_status = 'delivered', delivered_at = NOW(), \
                 updated_at = NOW() WHERE id = $1 RETURNING *",
            )
            .bind(order.id)
            .fetch_one(&mut *tx)
            .await?;
            sqlx::query(
                "UPDATE delivery_men SET completed_orders = completed_orders + 1, \
                 updated_at = NOW() WHERE id = $1",
            )
            .bind(courier.id)
            .execute(&mut *tx)
            .await?;
            updated
        }
        OrderStatus::Pending | OrderStatus::Cancelled => {
            sqlx::query_as::<_, Order>(
                "UPDATE orders SET order_status = $1, delivery_man_id = NULL, picked_at = NULL, \
                 updated_at = NOW() WHERE id = $2 RETURNING *",
            )
            .bind(to.as_str())
            .bind(order.id)
            .fetch_one(&mut *tx)
            .await?
        }
        _ => {
            sqlx::query_as::<_, Order>(
                "UPDATE orders SET order_status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
            )
            .bind(to.as_str())
            .bind(order.id)
            .fetch_one(&mut *tx)
            .await?
        }
    };
    tx.commit().await?;

    if to == OrderStatus::Delivered {
        state
            .publish(&OrderEvent::Delivered {
                order_id: order.id,
                delivery_man_id: courier.id,
            })
            .await;
    } else {
        state
            .publish(&OrderEvent::StatusChanged {
                order_id: order.id,
                from,
                to,
            })
            .await;
    }

    Ok(Json(serde_json::json!({ "success": true, "order": updated })))
}

/// Orders currently in the courier's hands.
pub async fn current(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Order>>> {
    let courier = active_courier(&state.db, &session).await?;
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE delivery_man_id = $1 \
         AND order_status IN ('confirmed', 'out_for_delivery') ORDER BY picked_at ASC",
    )
    .bind(courier.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(orders))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DayStats {
    pub count: i64,
    pub earnings: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub name: String,
    pub rating: i16,
    pub completed_orders: i64,
    pub current_count: i64,
    pub available_count: i64,
    pub today: DayStats,
    pub yesterday: DayStats,
}

/// Dashboard numbers: today's and yesterday's deliveries with earnings
/// (sum of delivery charges), plus the live queues.
pub async fn stats(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<StatsResponse>> {
    let courier = active_courier(&state.db, &session).await?;

    let today = sqlx::query_as::<_, DayStats>(
        "SELECT COUNT(*) AS count, COALESCE(SUM(delivery_charge), 0)::BIGINT AS earnings \
         FROM orders WHERE delivery_man_id = $1 AND order_status = 'delivered' \
         AND delivered_at >= date_trunc('day', NOW())",
    )
    .bind(courier.id)
    .fetch_one(&state.db)
    .await?;

    let yesterday = sqlx::query_as::<_, DayStats>(
        "SELECT COUNT(*) AS count, COALESCE(SUM(delivery_charge), 0)::BIGINT AS earnings \
         FROM orders WHERE delivery_man_id = $1 AND order_status = 'delivered' \
         AND delivered_at >= date_trunc('day', NOW()) - INTERVAL '1 day' \
         AND delivered_at < date_trunc('day', NOW())",
    )
    .bind(courier.id)
    .fetch_one(&state.db)
    .await?;

    let current_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM orders WHERE delivery_man_id = $1 \
         AND order_status IN ('confirmed', 'out_for_delivery')",
    )
    .bind(courier.id)
    .fetch_one(&state.db)
    .await?;

    let available_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM orders \
         WHERE order_status = 'pending' AND delivery_man_id IS NULL AND NOT is_parent",
    )
    .fetch_one(&state.db)
    .await?;

    Ok(Json(StatsResponse {
        name: courier.name,
        rating: courier.rating,
        completed_orders: courier.completed_orders,
        current_count,
        available_count,
        today,
        yesterday,
    }))
}
