//! HTTP surface: route table and shared handler helpers.

pub mod addresses;
pub mod admin;
pub mod coupons;
pub mod delivery;
pub mod delivery_charges;
pub mod locations;
pub mod orders;
pub mod products;
pub mod stores;

use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{Role, Session};
use crate::domain::order::StoreStatus;
use crate::error::{ApiError, ApiResult};
use crate::models::Store;
use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Public storefront
        .route("/api/stores", get(stores::list).post(stores::create))
        .route("/api/stores/:username", get(stores::get_by_username))
        .route(
            "/api/stores/:id/reviews",
            get(stores::reviews).post(stores::create_review),
        )
        .route("/api/products", get(products::list))
        .route("/api/products/:id", get(products::get))
        .route("/api/locations", get(locations::list))
        .route("/api/locations/by-name", get(locations::by_name))
        .route(
            "/api/delivery-charges/calculate",
            get(delivery_charges::calculate),
        )
        .route("/api/coupons/validate", post(coupons::validate))
        // Customer
        .route("/api/orders", post(orders::create).get(orders::list_mine))
        .route("/api/orders/:id", get(orders::get).put(orders::update_status))
        .route("/api/addresses", get(addresses::list).post(addresses::create))
        // Vendor
        .route("/api/store/orders", get(orders::list_store))
        .route("/api/store/stats", get(stores::stats))
        .route(
            "/api/store/products",
            get(products::list_own).post(products::create),
        )
        .route(
            "/api/store/products/:id",
            put(products::update).delete(products::remove),
        )
        .route(
            "/api/store/coupons",
            get(coupons::list_own).post(coupons::create),
        )
        .route("/api/store/coupons/:id", delete(coupons::remove))
        // Courier
        .route("/api/delivery/orders", get(delivery::available))
        .route("/api/delivery/orders/pick", post(delivery::pick))
        .route("/api/delivery/orders/status", post(delivery::update_status))
        .route("/api/delivery/orders/current", get(delivery::current))
        .route("/api/delivery/stats", get(delivery::stats))
        // Admin
        .route("/api/admin/stores", get(admin::list_stores))
        .route("/api/admin/stores/:id", put(admin::review_store))
        .route(
            "/api/admin/delivery-men",
            get(admin::list_delivery_men).post(admin::create_delivery_man),
        )
        .route("/api/admin/delivery-men/:id", put(admin::update_delivery_man))
        .route("/api/admin/locations", post(admin::create_location))
        .route("/api/admin/locations/:id", delete(admin::remove_location))
        .route(
            "/api/admin/delivery-charges",
            get(admin::list_delivery_charges).post(admin::create_delivery_charge),
        )
        .route(
            "/api/admin/delivery-charges/:id",
            delete(admin::remove_delivery_charge),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "vendora" }))
}

/// Resolves the calling vendor's store and refuses when it is not currently
/// `approved`. Approval is re-checked against the database on every sensitive
/// mutation rather than trusted from the session cookie, which only reflects
/// the state at login time.
pub(crate) async fn require_approved_store(
    db: &sqlx::PgPool,
    session: &Session,
) -> ApiResult<Store> {
    session.require(Role::Vendor)?;
    let store = sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE owner_id = $1")
        .bind(session.user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("store not found for the current user".into()))?;
    if store.status != StoreStatus::Approved.as_str() {
        return Err(ApiError::Forbidden("store is not approved".into()));
    }
    Ok(store)
}
