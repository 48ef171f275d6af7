//! Client-held shopping cart.
//!
//! The cart never touches the database: it lives in client storage, restored
//! on session start, and only becomes durable when checkout converts it into
//! order documents. This module is the canonical implementation of its
//! semantics, shared with tests and any server-rendered surface.
//!
//! Lines are keyed by product id, or `productId_variationId` when a
//! variation was chosen, and keep insertion order; checkout partitions
//! stores in the order they were first encountered.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Product, Variation, VariationPick};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    LineNotFound,
    Unpriced,
    InvalidQuantity,
}

impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LineNotFound => write!(f, "line not in cart"),
            Self::Unpriced => write!(f, "product has no price"),
            Self::InvalidQuantity => write!(f, "quantity must be at least 1"),
        }
    }
}

impl std::error::Error for CartError {}

/// One cart line. Price and mrp are snapshotted at add time; a later catalog
/// change does not reprice an uncommitted line (checkout re-validates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub key: String,
    pub product_id: Uuid,
    pub store_id: Option<Uuid>,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: i64,
    pub mrp: i64,
    #[serde(default)]
    pub variation: Option<VariationPick>,
}

impl CartLine {
    pub fn subtotal(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

pub fn line_key(product_id: Uuid, variation_id: Option<&str>) -> String {
    match variation_id {
        Some(vid) => format!("{product_id}_{vid}"),
        None => product_id.to_string(),
    }
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn subtotal(&self) -> i64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Adds a product (optionally a specific variation) to the cart.
    ///
    /// An existing line with the same key only grows in quantity; a new line
    /// snapshots the current price, mrp and first image.
    pub fn add(
        &mut self,
        product: &Product,
        variation: Option<&Variation>,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let key = line_key(product.id, variation.map(|v| v.id.as_str()));
        if let Some(line) = self.lines.iter_mut().find(|l| l.key == key) {
            line.quantity = line.quantity.saturating_add(quantity);
            return Ok(());
        }

        let (price, mrp) = match variation {
            Some(v) => (v.price, v.mrp.unwrap_or(v.price)),
            None => {
                let price = product.price.ok_or(CartError::Unpriced)?;
                (price, product.mrp.unwrap_or(price))
            }
        };

        self.lines.push(CartLine {
            key,
            product_id: product.id,
            store_id: Some(product.store_id),
            name: product.name.clone(),
            image: product.images.first().cloned().unwrap_or_default(),
            quantity,
            price,
            mrp,
            variation: variation.map(|v| VariationPick {
                id: v.id.clone(),
                attributes: v.attributes.clone(),
            }),
        });
        Ok(())
    }

    pub fn increment(&mut self, key: &str) -> Result<(), CartError> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.key == key)
            .ok_or(CartError::LineNotFound)?;
        line.quantity = line.quantity.saturating_add(1);
        Ok(())
    }

    /// Decrements a line; at quantity 1 the line is removed. The cart never
    /// holds a zero-quantity line.
    pub fn decrement(&mut self, key: &str) -> Result<(), CartError> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.key == key)
            .ok_or(CartError::LineNotFound)?;
        if self.lines[idx].quantity > 1 {
            self.lines[idx].quantity -= 1;
        } else {
            self.lines.remove(idx);
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<(), CartError> {
        let before = self.lines.len();
        self.lines.retain(|l| l.key != key);
        if self.lines.len() == before {
            return Err(CartError::LineNotFound);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Serialized form written to client storage after every mutation.
    pub fn to_storage(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restores a cart persisted with [`Cart::to_storage`].
    pub fn from_storage(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn product(price: i64, mrp: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            name: "Ceramic Mug".into(),
            description: "A mug".into(),
            category: "kitchen".into(),
            images: vec!["mug.png".into()],
            mrp: Some(mrp),
            price: Some(price),
            in_stock: true,
            variations: Json(vec![]),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn variation(id: &str, price: i64) -> Variation {
        Variation {
            id: id.into(),
            attributes: vec![crate::models::Attribute {
                name: "Color".into(),
                value: "Red".into(),
            }],
            price,
            mrp: None,
            sku: None,
        }
    }

    #[test]
    fn add_merges_same_key() {
        let p = product(100, 120);
        let mut cart = Cart::new();
        cart.add(&p, None, 2).unwrap();
        cart.add(&p, None, 1).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.subtotal(), 300);
    }

    #[test]
    fn variations_get_distinct_lines() {
        let p = product(100, 120);
        let red = variation("v1", 110);
        let blue = variation("v2", 115);
        let mut cart = Cart::new();
        cart.add(&p, Some(&red), 1).unwrap();
        cart.add(&p, Some(&blue), 1).unwrap();
        cart.add(&p, None, 1).unwrap();
        assert_eq!(cart.lines().len(), 3);
        assert_eq!(cart.subtotal(), 110 + 115 + 100);
    }

    #[test]
    fn decrement_at_one_removes_line() {
        let p = product(50, 50);
        let mut cart = Cart::new();
        cart.add(&p, None, 2).unwrap();
        let key = cart.lines()[0].key.clone();

        cart.decrement(&key).unwrap();
        assert_eq!(cart.lines()[0].quantity, 1);
        cart.decrement(&key).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.decrement(&key), Err(CartError::LineNotFound));
    }

    #[test]
    fn price_snapshot_survives_catalog_change() {
        let mut p = product(100, 120);
        let mut cart = Cart::new();
        cart.add(&p, None, 1).unwrap();
        p.price = Some(999);
        assert_eq!(cart.lines()[0].price, 100);
    }

    #[test]
    fn unpriced_product_is_rejected() {
        let mut p = product(100, 120);
        p.price = None;
        let mut cart = Cart::new();
        assert_eq!(cart.add(&p, None, 1), Err(CartError::Unpriced));
    }

    #[test]
    fn storage_round_trip_keeps_order() {
        let a = product(10, 10);
        let b = product(20, 20);
        let mut cart = Cart::new();
        cart.add(&a, None, 1).unwrap();
        cart.add(&b, None, 2).unwrap();

        let restored = Cart::from_storage(&cart.to_storage().unwrap()).unwrap();
        assert_eq!(restored.lines().len(), 2);
        assert_eq!(restored.lines()[0].product_id, a.id);
        assert_eq!(restored.subtotal(), 50);
    }
}
