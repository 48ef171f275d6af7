//! Session-cookie verification.
//!
//! Tokens are issued by the external identity service; this module only
//! checks them. A token is `hex(payload_json) + "." + hex(hmac_sha256)` where
//! the MAC is computed over the raw payload bytes. The payload carries the
//! subject id, role and expiry.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Vendor,
    Admin,
    Delivery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Verified caller identity, extracted from the session cookie.
///
/// Use `Option<Session>` on routes that allow guests.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Role,
}

impl Session {
    pub fn require(&self, role: Role) -> Result<(), ApiError> {
        if self.role == role {
            Ok(())
        } else {
            Err(ApiError::Forbidden("access denied".into()))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header = parts
            .headers
            .get(COOKIE)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let token = cookie_value(header, SESSION_COOKIE).ok_or(ApiError::Unauthorized)?;
        let claims =
            decode(&state.config.session_secret, token).ok_or(ApiError::Unauthorized)?;
        Ok(Session {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

/// Encodes claims into a signed token. The identity service owns issuance;
/// this lives here so both sides agree on the format.
pub fn encode(secret: &str, claims: &Claims) -> Option<String> {
    let payload = serde_json::to_vec(claims).ok()?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(&payload);
    Some(format!(
        "{}.{}",
        hex::encode(&payload),
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Verifies signature and expiry; `None` on any mismatch.
pub fn decode(secret: &str, token: &str) -> Option<Claims> {
    let (payload_hex, sig_hex) = token.split_once('.')?;
    let payload = hex::decode(payload_hex).ok()?;
    let sig = hex::decode(sig_hex).ok()?;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(&payload);
    mac.verify_slice(&sig).ok()?;

    let claims: Claims = serde_json::from_slice(&payload).ok()?;
    if claims.exp <= Utc::now().timestamp() {
        return None;
    }
    Some(claims)
}

fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.split_once('=').filter(|(k, _)| *k == name).map(|(_, v)| v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role, exp_offset: i64) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: Uuid::new_v4(),
            role,
            iat: now,
            exp: now + exp_offset,
        }
    }

    #[test]
    fn round_trip() {
        let c = claims(Role::Vendor, 3600);
        let token = encode("secret", &c).unwrap();
        let decoded = decode("secret", &token).unwrap();
        assert_eq!(decoded.sub, c.sub);
        assert_eq!(decoded.role, Role::Vendor);
    }

    #[test]
    fn rejects_tampered_payload() {
        let token = encode("secret", &claims(Role::Customer, 3600)).unwrap();
        let (payload, sig) = token.split_once('.').unwrap();
        let mut bytes = hex::decode(payload).unwrap();
        bytes[0] ^= 1;
        let forged = format!("{}.{}", hex::encode(bytes), sig);
        assert!(decode("secret", &forged).is_none());
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = encode("secret", &claims(Role::Admin, 3600)).unwrap();
        assert!(decode("other", &token).is_none());
    }

    #[test]
    fn rejects_expired() {
        let token = encode("secret", &claims(Role::Customer, -1)).unwrap();
        assert!(decode("secret", &token).is_none());
    }

    #[test]
    fn cookie_parsing() {
        let header = "theme=dark; session=abc.def; other=1";
        assert_eq!(cookie_value(header, "session"), Some("abc.def"));
        assert_eq!(cookie_value(header, "missing"), None);
    }
}
