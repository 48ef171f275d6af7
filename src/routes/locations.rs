//! Geographic zones referenced by stores and delivery addresses.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::models::Location;
use crate::AppState;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Location>>> {
    let locations =
        sqlx::query_as::<_, Location>("SELECT * FROM locations ORDER BY name")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(locations))
}

#[derive(Debug, Deserialize)]
pub struct ByNameParams {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub success: bool,
    pub location: Location,
}

/// Resolves a customer address to a zone by exact name match; used by the
/// client before asking for a delivery charge.
pub async fn by_name(
    State(state): State<AppState>,
    Query(p): Query<ByNameParams>,
) -> ApiResult<Json<LocationResponse>> {
    let location = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE name = $1")
        .bind(&p.name)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("location not found".into()))?;
    Ok(Json(LocationResponse {
        success: true,
        location,
    }))
}
