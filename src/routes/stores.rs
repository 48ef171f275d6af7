//! Store browsing, vendor signup submission, reviews and vendor stats.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::models::{Product, Store, StoreReview};
use crate::AppState;

/// Approved stores, newest first.
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Store>>> {
    let stores = sqlx::query_as::<_, Store>(
        "SELECT * FROM stores WHERE status = 'approved' ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(stores))
}

#[derive(Debug, Serialize)]
pub struct StorefrontResponse {
    pub success: bool,
    pub store: Store,
    pub products: Vec<Product>,
}

pub async fn get_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<StorefrontResponse>> {
    let store = sqlx::query_as::<_, Store>(
        "SELECT * FROM stores WHERE username = $1 AND status = 'approved'",
    )
    .bind(&username)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("store not found".into()))?;

    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE store_id = $1 ORDER BY created_at DESC",
    )
    .bind(store.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(StorefrontResponse {
        success: true,
        store,
        products,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStoreRequest {
    #[validate(length(min = 1, message = "store name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "store username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "store description is required"))]
    pub description: String,
    #[validate(email(message = "store email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "store contact number is required"))]
    pub contact: String,
    #[validate(length(min = 1, message = "store address is required"))]
    pub address: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CreateStoreResponse {
    pub success: bool,
    pub message: String,
    pub store: Store,
}

/// Vendor signup submission. The store is created `pending`; only an admin
/// review moves it to `approved` or `rejected`.
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CreateStoreRequest>,
) -> ApiResult<(StatusCode, Json<CreateStoreResponse>)> {
    req.validate()?;

    let store = sqlx::query_as::<_, Store>(
        "INSERT INTO stores (id, name, username, description, email, contact, address, image, \
         location_id, owner_id, status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending', NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&req.name)
    .bind(&req.username)
    .bind(&req.description)
    .bind(&req.email)
    .bind(&req.contact)
    .bind(&req.address)
    .bind(&req.image)
    .bind(req.location_id)
    .bind(session.user_id)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if ApiError::is_unique_violation(&e) {
            ApiError::Conflict("store name, username or email is already taken".into())
        } else {
            e.into()
        }
    })?;

    tracing::info!(store_id = %store.id, username = %store.username, "store submitted for review");

    Ok((
        StatusCode::CREATED,
        Json(CreateStoreResponse {
            success: true,
            message: "store submitted and awaiting approval".into(),
            store,
        }),
    ))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ReviewView {
    pub id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub user_name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ReviewView>>> {
    let reviews = sqlx::query_as::<_, ReviewView>(
        "SELECT r.id, r.rating, r.comment, u.name AS user_name, r.created_at \
         FROM store_reviews r JOIN users u ON u.id = r.user_id \
         WHERE r.store_id = $1 ORDER BY r.created_at DESC",
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(reviews))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

pub async fn create_review(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<StoreReview>)> {
    req.validate()?;

    // Only approved storefronts take reviews.
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM stores WHERE id = $1 AND status = 'approved'")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("store not found".into()))?;

    let review = sqlx::query_as::<_, StoreReview>(
        "INSERT INTO store_reviews (id, store_id, user_id, rating, comment, created_at) \
         VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(id)
    .bind(session.user_id)
    .bind(req.rating)
    .bind(&req.comment)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(review)))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StoreStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub delivered_orders: i64,
    pub cancelled_orders: i64,
    pub revenue: i64,
}

/// Order counts and delivered revenue for the caller's store.
pub async fn stats(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<StoreStats>> {
    let store = super::require_approved_store(&state.db, &session).await?;

    let stats = sqlx::query_as::<_, StoreStats>(
        "SELECT COUNT(*) AS total_orders, \
         COUNT(*) FILTER (WHERE order_status = 'pending') AS pending_orders, \
         COUNT(*) FILTER (WHERE order_status = 'delivered') AS delivered_orders, \
         COUNT(*) FILTER (WHERE order_status = 'cancelled') AS cancelled_orders, \
         COALESCE(SUM(final_amount) FILTER (WHERE order_status = 'delivered'), 0)::BIGINT AS revenue \
         FROM orders WHERE store_id = $1",
    )
    .bind(store.id)
    .fetch_one(&state.db)
    .await?;
    Ok(Json(stats))
}
