//! Environment-driven service configuration.

use anyhow::Context;

use crate::domain::pricing::{ChargeAllocation, DiscountPlacement};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Secret for the HMAC over the session cookie payload.
    pub session_secret: String,
    pub nats_url: Option<String>,
    /// How the single cart-level delivery charge is split across the
    /// sub-orders of a multi-store checkout.
    pub charge_allocation: ChargeAllocation,
    /// How a coupon discount is written onto the qualifying cart lines.
    pub discount_placement: DiscountPlacement,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let session_secret =
            std::env::var("SESSION_SECRET").context("SESSION_SECRET is not set")?;
        let port = match std::env::var("PORT") {
            Ok(v) => v.parse().context("PORT is not a valid port number")?,
            Err(_) => 8083,
        };
        let charge_allocation = match std::env::var("CHARGE_ALLOCATION") {
            Ok(v) => v
                .parse()
                .map_err(|_| anyhow::anyhow!("CHARGE_ALLOCATION must be first_store or proportional"))?,
            Err(_) => ChargeAllocation::default(),
        };
        let discount_placement = match std::env::var("DISCOUNT_PLACEMENT") {
            Ok(v) => v
                .parse()
                .map_err(|_| anyhow::anyhow!("DISCOUNT_PLACEMENT must be concentrate or proportional"))?,
            Err(_) => DiscountPlacement::default(),
        };

        Ok(Self {
            database_url,
            port,
            session_secret,
            nats_url: std::env::var("NATS_URL").ok(),
            charge_allocation,
            discount_placement,
        })
    }
}
