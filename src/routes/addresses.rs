//! Saved delivery addresses. Checkout still receives a full address snapshot
//! in its own body; this is only the customer's address book.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Session;
use crate::error::ApiResult;
use crate::models::Address;
use crate::AppState;

pub async fn list(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Address>>> {
    let addresses = sqlx::query_as::<_, Address>(
        "SELECT * FROM addresses WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(session.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(addresses))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAddressRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "street is required"))]
    pub street: String,
    #[serde(default)]
    pub location: String,
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CreateAddressRequest>,
) -> ApiResult<(StatusCode, Json<Address>)> {
    req.validate()?;
    let address = sqlx::query_as::<_, Address>(
        "INSERT INTO addresses (id, user_id, name, phone, street, location, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(session.user_id)
    .bind(&req.name)
    .bind(&req.phone)
    .bind(&req.street)
    .bind(&req.location)
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(address)))
}
