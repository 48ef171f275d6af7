//! Product catalog: public browsing and vendor CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use sqlx::types::Json as Jsonb;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::models::{Attribute, Product, Variation};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub store_id: Option<Uuid>,
    pub category: Option<String>,
    pub search: Option<String>,
}

/// Public catalog. Only products of approved stores are visible.
pub async fn list(
    State(state): State<AppState>,
    Query(p): Query<ListParams>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT p.* FROM products p JOIN stores s ON s.id = p.store_id \
         WHERE s.status = 'approved' \
         AND ($1::uuid IS NULL OR p.store_id = $1) \
         AND ($2::text IS NULL OR p.category = $2) \
         AND ($3::text IS NULL OR p.name ILIKE '%' || $3 || '%') \
         ORDER BY p.created_at DESC",
    )
    .bind(p.store_id)
    .bind(p.category)
    .bind(p.search)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(products))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Product>> {
    sqlx::query_as::<_, Product>(
        "SELECT p.* FROM products p JOIN stores s ON s.id = p.store_id \
         WHERE p.id = $1 AND s.status = 'approved'",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("product not found".into()))
}

/// The calling vendor's own catalog.
pub async fn list_own(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Product>>> {
    let store = super::require_approved_store(&state.db, &session).await?;
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE store_id = $1 ORDER BY created_at DESC",
    )
    .bind(store.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(products))
}

#[derive(Debug, Deserialize, Validate)]
pub struct VariationInput {
    #[validate(length(min = 1, message = "a variation needs at least one attribute"))]
    pub attributes: Vec<Attribute>,
    #[validate(range(min = 0, message = "variation price must not be negative"))]
    pub price: i64,
    #[serde(default)]
    pub mrp: Option<i64>,
    #[serde(default)]
    pub sku: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(length(min = 1, message = "product name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "product description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "product category is required"))]
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub mrp: Option<i64>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    #[validate]
    pub variations: Vec<VariationInput>,
}

fn default_in_stock() -> bool {
    true
}

/// Price never exceeds mrp: per variation when variations exist, otherwise
/// at product level, where a flat price is then required.
fn check_pricing(req: &ProductRequest) -> Result<(), ApiError> {
    if req.variations.is_empty() {
        let price = req
            .price
            .ok_or_else(|| ApiError::BadRequest("a product without variations needs a price".into()))?;
        if price < 0 {
            return Err(ApiError::BadRequest("price must not be negative".into()));
        }
        if let Some(mrp) = req.mrp {
            if price > mrp {
                return Err(ApiError::BadRequest("price cannot exceed mrp".into()));
            }
        }
    } else {
        for v in &req.variations {
            if let Some(mrp) = v.mrp {
                if v.price > mrp {
                    return Err(ApiError::BadRequest(
                        "variation price cannot exceed its mrp".into(),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn build_variations(inputs: Vec<VariationInput>) -> Vec<Variation> {
    inputs
        .into_iter()
        .map(|v| Variation {
            id: Uuid::new_v4().to_string(),
            attributes: v.attributes,
            price: v.price,
            mrp: v.mrp,
            sku: v.sku,
        })
        .collect()
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<ProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let store = super::require_approved_store(&state.db, &session).await?;
    req.validate()?;
    check_pricing(&req)?;

    let variations = build_variations(req.variations);
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, store_id, name, description, category, images, mrp, price, \
         in_stock, variations, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(store.id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(&req.category)
    .bind(&req.images)
    .bind(req.mrp)
    .bind(req.price)
    .bind(req.in_stock)
    .bind(Jsonb(variations))
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(req): Json<ProductRequest>,
) -> ApiResult<Json<Product>> {
    let store = super::require_approved_store(&state.db, &session).await?;
    req.validate()?;
    check_pricing(&req)?;

    let variations = build_variations(req.variations);
    sqlx::query_as::<_, Product>(
        "UPDATE products SET name = $3, description = $4, category = $5, images = $6, mrp = $7, \
         price = $8, in_stock = $9, variations = $10, updated_at = NOW() \
         WHERE id = $1 AND store_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(store.id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(&req.category)
    .bind(&req.images)
    .bind(req.mrp)
    .bind(req.price)
    .bind(req.in_stock)
    .bind(Jsonb(variations))
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("product not found".into()))
}

pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let store = super::require_approved_store(&state.db, &session).await?;
    let result = sqlx::query("DELETE FROM products WHERE id = $1 AND store_id = $2")
        .bind(id)
        .bind(store.id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("product not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
