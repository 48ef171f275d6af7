//! Persisted row types and the embedded JSONB documents they carry.
//!
//! Status columns are plain text in the database; the corresponding enums in
//! [`crate::domain`] own the legal values and transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub description: String,
    pub email: String,
    pub contact: String,
    pub address: String,
    pub image: String,
    pub location_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoreReview {
    pub id: Uuid,
    pub store_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// One named attribute of a product variation, e.g. `{name: "Color", value: "Red"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// A purchasable variation of a product with its own price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variation {
    pub id: String,
    pub attributes: Vec<Attribute>,
    pub price: i64,
    #[serde(default)]
    pub mrp: Option<i64>,
    #[serde(default)]
    pub sku: Option<String>,
}

/// The variation choice snapshotted onto a cart line or order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationPick {
    pub id: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub images: Vec<String>,
    pub mrp: Option<i64>,
    pub price: Option<i64>,
    pub in_stock: bool,
    pub variations: Json<Vec<Variation>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Current catalog unit price for the given variation choice, if priced.
    pub fn unit_price(&self, variation_id: Option<&str>) -> Option<i64> {
        match variation_id {
            Some(vid) => self.variations.0.iter().find(|v| v.id == vid).map(|v| v.price),
            None => self.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub description: String,
    pub discount_pct: i16,
    pub store_id: Uuid,
    pub for_new_user: bool,
    pub for_member: bool,
    pub is_public: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeliveryCharge {
    pub id: Uuid,
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    pub charge: i64,
}

/// Delivery destination snapshotted onto every order at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DeliveryAddress {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "street is required"))]
    pub street: String,
    #[serde(default)]
    pub location: String,
}

/// A line embedded in an order document. The owning store lives on the order
/// itself, not on the item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: i64,
    #[serde(default)]
    pub variation: Option<VariationPick>,
    #[serde(default)]
    pub discounted_price: Option<i64>,
    #[serde(default)]
    pub coupon_applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub items: Json<Vec<OrderItem>>,
    pub is_parent: bool,
    pub parent_order_id: Option<Uuid>,
    pub sub_orders: Vec<Uuid>,
    pub delivery_address: Json<DeliveryAddress>,
    pub total_price: i64,
    pub total_discount: i64,
    pub delivery_charge: i64,
    pub final_amount: i64,
    pub payment_method: String,
    pub payment_status: String,
    pub order_status: String,
    pub delivery_man_id: Option<Uuid>,
    pub picked_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeliveryMan {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub vehicle_type: String,
    pub license_number: String,
    pub is_active: bool,
    pub completed_orders: i64,
    pub rating: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub phone: String,
    pub street: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
}
