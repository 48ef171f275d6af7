//! Vendora, a multi-vendor e-commerce backend.
//!
//! Customers browse vendor stores and check out a cart that may span several
//! of them; checkout decomposes into one order per store under an umbrella
//! parent order. Vendors manage catalog, coupons and order statuses, couriers
//! claim and deliver pending orders, admins approve stores and maintain the
//! delivery-charge table.
//!
//! Session issuance is external; this service only verifies the signed
//! session cookie (see [`auth`]).

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod models;
pub mod routes;

use std::sync::Arc;

use crate::config::Config;
use crate::domain::events::OrderEvent;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub nats: Option<async_nats::Client>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Publishes an order event when an event bus is configured.
    ///
    /// A failed publish is logged and never fails the request that produced
    /// the event.
    pub async fn publish(&self, event: &OrderEvent) {
        let Some(nats) = &self.nats else { return };
        let payload = match serde_json::to_vec(event) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize order event");
                return;
            }
        };
        if let Err(e) = nats.publish(event.subject().to_string(), payload.into()).await {
            tracing::warn!(error = %e, subject = event.subject(), "failed to publish order event");
        }
    }
}
