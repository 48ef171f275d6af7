//! Business rules, kept pure and independent of the HTTP and storage layers.

pub mod cart;
pub mod coupon;
pub mod events;
pub mod order;
pub mod pricing;
