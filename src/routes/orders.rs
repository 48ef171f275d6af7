//! Checkout and order reads/updates.
//!
//! Checkout re-validates the client cart against the catalog, places any
//! coupon discount, decomposes the cart into per-store orders (plus an
//! umbrella parent when more than one store is involved) and persists the
//! whole group in a single transaction.

use std::collections::{HashMap, HashSet};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::types::Json as Jsonb;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Session;
use crate::domain::events::OrderEvent;
use crate::domain::order::{OrderStatus, PaymentMethod};
use crate::domain::pricing::{self, CheckoutLine};
use crate::error::{ApiError, ApiResult};
use crate::models::{DeliveryAddress, Order, Product, User};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, message = "items are required"))]
    pub items: Vec<CheckoutLine>,
    #[validate]
    pub delivery_address: DeliveryAddress,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub delivery_charge: i64,
    // Client-computed grand totals, accepted for wire compatibility; the
    // server recomputes both from the validated lines.
    #[serde(default)]
    pub total_price: Option<i64>,
    #[serde(default)]
    pub total_discount: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub success: bool,
    pub message: String,
    pub orders: Vec<Order>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_items: Vec<CheckoutLine>,
}

pub async fn create(
    State(state): State<AppState>,
    session: Option<Session>,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<CheckoutResponse>)> {
    req.validate()?;
    if req.delivery_charge < 0 {
        return Err(ApiError::BadRequest("delivery charge must not be negative".into()));
    }

    let mut lines = req.items;
    revalidate_against_catalog(&state, &mut lines).await?;

    if let Some(code) = req.coupon_code.as_deref() {
        let coupon = super::coupons::fetch_active(&state.db, code)
            .await?
            .ok_or_else(|| ApiError::NotFound("invalid or expired coupon".into()))?;
        pricing::place_discount(
            &mut lines,
            coupon.store_id,
            i64::from(coupon.discount_pct),
            state.config.discount_placement,
        );
    }

    let plan = pricing::plan(lines, req.delivery_charge, state.config.charge_allocation)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let user_id = session.as_ref().map(|s| s.user_id);
    let orders = persist_plan(&state, user_id, &req.delivery_address, req.payment_method, &plan)
        .await?;

    tracing::info!(
        orders = plan.stores.len(),
        multi_store = plan.needs_parent(),
        total = plan.parent_final_amount(),
        "checkout completed"
    );
    for order in &orders {
        state
            .publish(&OrderEvent::Created {
                order_id: order.id,
                store_id: order.store_id,
                final_amount: order.final_amount,
                multi_store: plan.needs_parent(),
            })
            .await;
    }

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            success: true,
            message: format!("{} order(s) created successfully", plan.stores.len()),
            orders,
            skipped_items: plan.skipped.clone(),
        }),
    ))
}

/// Checks every line against the current catalog. Product gone → the line is
/// left storeless for the planner to surface as skipped; a price that moved
/// or a store that cannot take orders rejects the checkout outright.
async fn revalidate_against_catalog(
    state: &AppState,
    lines: &mut [CheckoutLine],
) -> ApiResult<()> {
    let ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
        .bind(&ids)
        .fetch_all(&state.db)
        .await?;
    let by_id: HashMap<Uuid, &Product> = products.iter().map(|p| (p.id, p)).collect();

    let store_ids: Vec<Uuid> = products.iter().map(|p| p.store_id).collect();
    let approved: HashSet<Uuid> = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM stores WHERE id = ANY($1) AND status = 'approved'",
    )
    .bind(&store_ids)
    .fetch_all(&state.db)
    .await?
    .into_iter()
    .collect();

    let mut stale = Vec::new();
    for line in lines.iter_mut() {
        let Some(product) = by_id.get(&line.product_id) else {
            line.store_id = None;
            continue;
        };
        match product.unit_price(line.variation.as_ref().map(|v| v.id.as_str())) {
            Some(current) if current == line.price => {}
            Some(current) => stale.push(format!(
                "{}: price changed from {} to {}",
                line.name, line.price, current
            )),
            None => stale.push(format!("{}: no longer purchasable", line.name)),
        }
        if !approved.contains(&product.store_id) {
            stale.push(format!("{}: store is not accepting orders", line.name));
        }
        // The catalog, not the client, says which store owns a product.
        line.store_id = Some(product.store_id);
    }

    if stale.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Conflict(format!(
            "cart is out of date: {}",
            stale.join("; ")
        )))
    }
}

/// Writes the decomposition as one transaction: parent first (when needed),
/// then one sub-order per store, then the parent's sub-order list. All rows
/// appear together or not at all.
async fn persist_plan(
    state: &AppState,
    user_id: Option<Uuid>,
    address: &DeliveryAddress,
    payment_method: PaymentMethod,
    plan: &pricing::Plan,
) -> ApiResult<Vec<Order>> {
    let mut tx = state.db.begin().await?;
    let mut orders = Vec::with_capacity(plan.stores.len() + 1);

    let parent_id = if plan.needs_parent() {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO orders (id, user_id, items, is_parent, delivery_address, total_price, \
             total_discount, delivery_charge, final_amount, payment_method) \
             VALUES ($1, $2, '[]', TRUE, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id)
        .bind(user_id)
        .bind(Jsonb(address))
        .bind(plan.grand_total)
        .bind(plan.grand_discount)
        .bind(plan.delivery_charge)
        .bind(plan.parent_final_amount())
        .bind(payment_method.as_str())
        .execute(&mut *tx)
        .await?;
        Some(id)
    } else {
        None
    };

    let mut sub_ids = Vec::with_capacity(plan.stores.len());
    for draft in &plan.stores {
        let order = sqlx::query_as::<_, Order>(
            "INSERT INTO orders (id, user_id, store_id, items, parent_order_id, \
             delivery_address, total_price, total_discount, delivery_charge, final_amount, \
             payment_method) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(draft.store_id)
        .bind(Jsonb(&draft.items))
        .bind(parent_id)
        .bind(Jsonb(address))
        .bind(draft.total_price)
        .bind(draft.total_discount)
        .bind(draft.delivery_charge)
        .bind(draft.final_amount)
        .bind(payment_method.as_str())
        .fetch_one(&mut *tx)
        .await?;
        sub_ids.push(order.id);
        orders.push(order);
    }

    if let Some(parent_id) = parent_id {
        let parent = sqlx::query_as::<_, Order>(
            "UPDATE orders SET sub_orders = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(&sub_ids)
        .bind(parent_id)
        .fetch_one(&mut *tx)
        .await?;
        orders.insert(0, parent);
    }

    tx.commit().await?;
    Ok(orders)
}

/// The caller's own orders, newest first. Parent orders are receipts, not
/// fulfillable units, and are left out of the listing.
pub async fn list_mine(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Order>>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 AND NOT is_parent ORDER BY created_at DESC",
    )
    .bind(session.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(orders))
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub store_name: Option<String>,
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_orders: Vec<OrderView>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub success: bool,
    pub order: OrderView,
}

/// One order, populated with its store name; a parent carries its nested
/// sub-orders.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OrderResponse>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("order not found".into()))?;

    let subs = if order.is_parent {
        sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE parent_order_id = $1 ORDER BY created_at",
        )
        .bind(order.id)
        .fetch_all(&state.db)
        .await?
    } else {
        vec![]
    };

    let mut store_ids: Vec<Uuid> = subs.iter().filter_map(|o| o.store_id).collect();
    if let Some(sid) = order.store_id {
        store_ids.push(sid);
    }
    let names: HashMap<Uuid, String> = sqlx::query_as::<_, (Uuid, String)>(
        "SELECT id, name FROM stores WHERE id = ANY($1)",
    )
    .bind(&store_ids)
    .fetch_all(&state.db)
    .await?
    .into_iter()
    .collect();

    let customer = match order.user_id {
        Some(uid) => sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(uid)
            .fetch_optional(&state.db)
            .await?,
        None => None,
    };
    let customer_name = customer.map(|u| u.name);

    let view = OrderView {
        store_name: order.store_id.and_then(|sid| names.get(&sid).cloned()),
        customer_name: customer_name.clone(),
        sub_orders: subs
            .into_iter()
            .map(|sub| OrderView {
                store_name: sub.store_id.and_then(|sid| names.get(&sid).cloned()),
                customer_name: customer_name.clone(),
                sub_orders: vec![],
                order: sub,
            })
            .collect(),
        order,
    };
    Ok(Json(OrderResponse {
        success: true,
        order: view,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub order_status: String,
}

/// Vendor-side status write. Any status in the enum may be set, but only by
/// the approved store that owns the order, and never on a delivered one.
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let store = super::require_approved_store(&state.db, &session).await?;

    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("order not found".into()))?;
    if order.store_id != Some(store.id) {
        return Err(ApiError::Forbidden("you do not own this order".into()));
    }

    let to: OrderStatus = req
        .order_status
        .parse()
        .map_err(|_| ApiError::BadRequest("unknown order status".into()))?;
    let from = order.order_status.parse::<OrderStatus>().ok();
    if from.is_some_and(OrderStatus::is_terminal) {
        return Err(ApiError::Conflict("order is already delivered".into()));
    }

    let updated = sqlx::query_as::<_, Order>(
        "UPDATE orders SET order_status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(to.as_str())
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    if let Some(from) = from {
        state
            .publish(&OrderEvent::StatusChanged {
                order_id: id,
                from,
                to,
            })
            .await;
    }

    Ok(Json(serde_json::json!({ "success": true, "order": updated })))
}

/// Orders of the calling vendor's store, newest first.
pub async fn list_store(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Order>>> {
    let store = super::require_approved_store(&state.db, &session).await?;
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE store_id = $1 ORDER BY created_at DESC",
    )
    .bind(store.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(orders))
}
