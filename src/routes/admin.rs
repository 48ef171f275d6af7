//! Admin panel: store approval, couriers, zones, delivery charges.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{Role, Session};
use crate::domain::order::StoreStatus;
use crate::error::{ApiError, ApiResult};
use crate::models::{DeliveryCharge, DeliveryMan, Location, Store};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StoreFilter {
    pub status: Option<String>,
}

pub async fn list_stores(
    State(state): State<AppState>,
    session: Session,
    Query(f): Query<StoreFilter>,
) -> ApiResult<Json<Vec<Store>>> {
    session.require(Role::Admin)?;
    let stores = sqlx::query_as::<_, Store>(
        "SELECT * FROM stores WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at DESC",
    )
    .bind(f.status)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(stores))
}

#[derive(Debug, Deserialize)]
pub struct ReviewStoreRequest {
    pub status: String,
}

/// Admin review of a vendor signup: `approved` or `rejected` only. Store
/// status never changes through any other path.
pub async fn review_store(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewStoreRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    session.require(Role::Admin)?;
    let status: StoreStatus = req
        .status
        .parse()
        .map_err(|_| ApiError::BadRequest("unknown store status".into()))?;
    if status == StoreStatus::Pending {
        return Err(ApiError::BadRequest(
            "a store can only be approved or rejected".into(),
        ));
    }

    let store = sqlx::query_as::<_, Store>(
        "UPDATE stores SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(status.as_str())
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("store not found".into()))?;

    tracing::info!(store_id = %store.id, status = %req.status, "store reviewed");
    Ok(Json(serde_json::json!({ "success": true, "store": store })))
}

pub async fn list_delivery_men(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<DeliveryMan>>> {
    session.require(Role::Admin)?;
    let couriers = sqlx::query_as::<_, DeliveryMan>(
        "SELECT * FROM delivery_men ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(couriers))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDeliveryManRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    pub vehicle_type: VehicleType,
    #[validate(length(min = 1, message = "license number is required"))]
    pub license_number: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Bike,
    Car,
    Van,
}

impl VehicleType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Bike => "bike",
            Self::Car => "car",
            Self::Van => "van",
        }
    }
}

pub async fn create_delivery_man(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CreateDeliveryManRequest>,
) -> ApiResult<(StatusCode, Json<DeliveryMan>)> {
    session.require(Role::Admin)?;
    req.validate()?;

    let courier = sqlx::query_as::<_, DeliveryMan>(
        "INSERT INTO delivery_men (id, name, email, phone, vehicle_type, license_number, \
         created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&req.name)
    .bind(&req.email)
    .bind(&req.phone)
    .bind(req.vehicle_type.as_str())
    .bind(&req.license_number)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if ApiError::is_unique_violation(&e) {
            ApiError::Conflict("a courier with this email already exists".into())
        } else {
            e.into()
        }
    })?;

    Ok((StatusCode::CREATED, Json(courier)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateDeliveryManRequest {
    pub is_active: bool,
}

pub async fn update_delivery_man(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDeliveryManRequest>,
) -> ApiResult<Json<DeliveryMan>> {
    session.require(Role::Admin)?;
    sqlx::query_as::<_, DeliveryMan>(
        "UPDATE delivery_men SET is_active = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(req.is_active)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("courier not found".into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLocationRequest {
    #[validate(length(min = 1, message = "location name is required"))]
    pub name: String,
}

pub async fn create_location(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CreateLocationRequest>,
) -> ApiResult<(StatusCode, Json<Location>)> {
    session.require(Role::Admin)?;
    req.validate()?;

    let location = sqlx::query_as::<_, Location>(
        "INSERT INTO locations (id, name, created_at) VALUES ($1, $2, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(req.name.trim())
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if ApiError::is_unique_violation(&e) {
            ApiError::Conflict("location already exists".into())
        } else {
            e.into()
        }
    })?;

    Ok((StatusCode::CREATED, Json(location)))
}

pub async fn remove_location(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    session.require(Role::Admin)?;
    let result = sqlx::query("DELETE FROM locations WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            let referenced = e
                .as_database_error()
                .and_then(|db| db.code())
                .is_some_and(|code| code == "23503");
            if referenced {
                ApiError::Conflict("location is referenced by stores or charges".into())
            } else {
                e.into()
            }
        })?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("location not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_delivery_charges(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<DeliveryCharge>>> {
    session.require(Role::Admin)?;
    let charges = sqlx::query_as::<_, DeliveryCharge>("SELECT * FROM delivery_charges")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(charges))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateChargeRequest {
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    #[validate(range(min = 0, message = "charge must not be negative"))]
    pub charge: i64,
}

pub async fn create_delivery_charge(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CreateChargeRequest>,
) -> ApiResult<(StatusCode, Json<DeliveryCharge>)> {
    session.require(Role::Admin)?;
    req.validate()?;
    if req.from_location_id == req.to_location_id {
        return Err(ApiError::BadRequest(
            "from and to locations must differ".into(),
        ));
    }

    let charge = sqlx::query_as::<_, DeliveryCharge>(
        "INSERT INTO delivery_charges (id, from_location_id, to_location_id, charge) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(req.from_location_id)
    .bind(req.to_location_id)
    .bind(req.charge)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if ApiError::is_unique_violation(&e) {
            ApiError::Conflict("a charge for this route already exists".into())
        } else {
            e.into()
        }
    })?;

    Ok((StatusCode::CREATED, Json(charge)))
}

pub async fn remove_delivery_charge(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    session.require(Role::Admin)?;
    let result = sqlx::query("DELETE FROM delivery_charges WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("delivery charge not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
