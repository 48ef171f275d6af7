//! Coupon validation for carts and vendor coupon management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::Session;
use crate::domain::coupon;
use crate::domain::pricing::CheckoutLine;
use crate::error::{ApiError, ApiResult};
use crate::models::Coupon;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub code: String,
    pub cart_items: Vec<CheckoutLine>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub discount: i64,
    pub discounted_amount: i64,
    pub coupon: Coupon,
}

/// Quotes a coupon against the submitted cart. Pure read: the coupon is
/// never consumed and can be validated repeatedly.
pub async fn validate(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> ApiResult<Json<ValidateResponse>> {
    let coupon = fetch_active(&state.db, &req.code)
        .await?
        .ok_or_else(|| ApiError::NotFound("invalid or expired coupon".into()))?;

    let quote = coupon::quote(coupon.store_id, i64::from(coupon.discount_pct), &req.cart_items);
    Ok(Json(ValidateResponse {
        discount: quote.discount,
        discounted_amount: quote.discounted_amount,
        coupon,
    }))
}

/// Unexpired coupon by code; codes are stored and matched uppercase.
pub(crate) async fn fetch_active(
    db: &sqlx::PgPool,
    code: &str,
) -> Result<Option<Coupon>, sqlx::Error> {
    sqlx::query_as::<_, Coupon>(
        "SELECT * FROM coupons WHERE code = $1 AND expires_at > NOW()",
    )
    .bind(code.trim().to_uppercase())
    .fetch_optional(db)
    .await
}

pub async fn list_own(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Coupon>>> {
    let store = super::require_approved_store(&state.db, &session).await?;
    let coupons = sqlx::query_as::<_, Coupon>(
        "SELECT * FROM coupons WHERE store_id = $1 ORDER BY created_at DESC",
    )
    .bind(store.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(coupons))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCouponRequest {
    #[validate(length(min = 1, message = "coupon code is required"))]
    pub code: String,
    #[validate(length(min = 1, message = "coupon description is required"))]
    pub description: String,
    #[validate(range(min = 1, max = 100, message = "discount must be between 1 and 100"))]
    pub discount_pct: i16,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub for_new_user: bool,
    #[serde(default)]
    pub for_member: bool,
    #[serde(default)]
    pub is_public: bool,
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CreateCouponRequest>,
) -> ApiResult<(StatusCode, Json<Coupon>)> {
    let store = super::require_approved_store(&state.db, &session).await?;
    req.validate()?;

    let coupon = sqlx::query_as::<_, Coupon>(
        "INSERT INTO coupons (id, code, description, discount_pct, store_id, for_new_user, \
         for_member, is_public, expires_at, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(req.code.trim().to_uppercase())
    .bind(&req.description)
    .bind(req.discount_pct)
    .bind(store.id)
    .bind(req.for_new_user)
    .bind(req.for_member)
    .bind(req.is_public)
    .bind(req.expires_at)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if ApiError::is_unique_violation(&e) {
            ApiError::Conflict("coupon code already exists".into())
        } else {
            e.into()
        }
    })?;

    Ok((StatusCode::CREATED, Json(coupon)))
}

pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let store = super::require_approved_store(&state.db, &session).await?;
    let result = sqlx::query("DELETE FROM coupons WHERE id = $1 AND store_id = $2")
        .bind(id)
        .bind(store.id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("coupon not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
