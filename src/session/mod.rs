//! Session token state and supporting protocol types.
//!
//! A session is always a full token pair. The pair is created by the login
//! exchange, replaced wholesale by the refresh protocol, and destroyed on
//! logout or terminal refresh failure. Partial updates are disallowed: the
//! identity backend issues both tokens together.

pub mod claims;
pub mod cookies;
pub mod refresh;

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use utoipa::ToSchema;

/// Access and refresh token pair with absolute expiry timestamps in epoch
/// milliseconds, as issued by the identity backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: i64,
    pub refresh_token_expires_at: i64,
}

impl TokenPair {
    #[must_use]
    pub fn is_access_token_valid(&self, now_millis: i64) -> bool {
        now_millis < self.access_token_expires_at
    }

    #[must_use]
    pub fn is_refresh_token_valid(&self, now_millis: i64) -> bool {
        now_millis < self.refresh_token_expires_at
    }

    /// A session is usable while either token is still alive. Once both have
    /// expired the pair must be discarded.
    #[must_use]
    pub fn is_session_valid(&self, now_millis: i64) -> bool {
        self.is_access_token_valid(now_millis) || self.is_refresh_token_valid(now_millis)
    }
}

/// User identity attached to a session. Opaque pass-through from the backend
/// login response; the gateway neither validates nor stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Authentication protocol errors surfaced across the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Backend rejected the credentials. Deliberately does not distinguish
    /// unknown email from wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,
    /// Backend unreachable or timed out. Transient, retryable.
    #[error("identity backend unreachable")]
    NetworkFailure,
    /// Refresh token rejected. Terminal for the current session.
    #[error("session expired")]
    SessionExpired,
    /// Token failed to decode. Treated as "no claims", never propagated as
    /// a crash.
    #[error("malformed token")]
    MalformedToken,
    /// Backend answered with an unexpected status or body.
    #[error("identity backend error: {0}")]
    Backend(String),
}

/// Current time in epoch milliseconds.
///
/// Clock regressions before the epoch are collapsed to zero, which reads as
/// "everything expired" and fails closed.
#[must_use]
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(access_exp: i64, refresh_exp: i64) -> TokenPair {
        TokenPair {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        }
    }

    #[test]
    fn access_token_validity_is_strict() {
        let p = pair(1_000, 2_000);
        assert!(p.is_access_token_valid(999));
        assert!(!p.is_access_token_valid(1_000));
        assert!(!p.is_access_token_valid(1_001));
    }

    #[test]
    fn session_valid_while_either_token_lives() {
        let p = pair(1_000, 2_000);
        assert!(p.is_session_valid(500));
        assert!(p.is_session_valid(1_500));
        assert!(!p.is_session_valid(2_000));
    }

    #[test]
    fn token_pair_serializes_camel_case() {
        let p = pair(1, 2);
        let value = serde_json::to_value(&p).expect("serialize");
        assert!(value.get("accessToken").is_some());
        assert!(value.get("refreshTokenExpiresAt").is_some());
        let decoded: TokenPair = serde_json::from_value(value).expect("deserialize");
        assert_eq!(decoded, p);
    }

    #[test]
    fn now_millis_is_monotonic_enough() {
        let a = now_millis();
        let b = now_millis();
        assert!(b >= a);
        assert!(a > 1_600_000_000_000, "now_millis should be a modern epoch");
    }
}
