//! Session cookie contract.
//!
//! The token pair crosses the process boundary as four cookies set together
//! on every mutation: the two tokens as `HttpOnly` cookies for the request
//! gate, and two readable expiry mirrors for client-side state. `store` and
//! `clear` always emit all four so a reader can never observe a new access
//! token next to an old refresh token.

use axum::http::{HeaderMap, HeaderValue, header::COOKIE};

use super::TokenPair;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";
pub const ACCESS_EXPIRY_COOKIE: &str = "accessTokenExpiresAt";
pub const REFRESH_EXPIRY_COOKIE: &str = "refreshTokenExpiresAt";

/// Cookie-backed session state as seen by one request. Absent cookies stay
/// `None`; the gate works from presence plus decoded claims, never from
/// hidden per-connection state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub access_token_expires_at: Option<i64>,
    pub refresh_token_expires_at: Option<i64>,
}

impl CookieState {
    /// Parse session cookies out of request headers. Unparseable expiry
    /// mirrors are dropped rather than rejected.
    #[must_use]
    pub fn read(headers: &HeaderMap) -> Self {
        Self {
            access_token: cookie_value(headers, ACCESS_COOKIE),
            refresh_token: cookie_value(headers, REFRESH_COOKIE),
            access_token_expires_at: cookie_value(headers, ACCESS_EXPIRY_COOKIE)
                .and_then(|value| value.parse().ok()),
            refresh_token_expires_at: cookie_value(headers, REFRESH_EXPIRY_COOKIE)
                .and_then(|value| value.parse().ok()),
        }
    }

    #[must_use]
    pub fn has_access_token(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Reconstruct the full pair when all four cookies are present.
    #[must_use]
    pub fn token_pair(&self) -> Option<TokenPair> {
        Some(TokenPair {
            access_token: self.access_token.clone()?,
            refresh_token: self.refresh_token.clone()?,
            access_token_expires_at: self.access_token_expires_at?,
            refresh_token_expires_at: self.refresh_token_expires_at?,
        })
    }

    /// Pair suitable for the refresh protocol: only the refresh token is
    /// required, an already-dropped access cookie reads as expired.
    #[must_use]
    pub fn refreshable_pair(&self) -> Option<TokenPair> {
        let refresh_token = self.refresh_token.clone().filter(|t| !t.is_empty())?;
        Some(TokenPair {
            access_token: self.access_token.clone().unwrap_or_default(),
            refresh_token,
            access_token_expires_at: self.access_token_expires_at.unwrap_or(0),
            refresh_token_expires_at: self.refresh_token_expires_at.unwrap_or(0),
        })
    }
}

/// `Set-Cookie` values that install a token pair. The pair is written
/// atomically: all four cookies in one response.
///
/// # Errors
/// Returns an error if a token contains bytes invalid in a header value.
pub fn store(
    pair: &TokenPair,
    secure: bool,
    now_millis: i64,
) -> Result<Vec<HeaderValue>, axum::http::header::InvalidHeaderValue> {
    let access_max_age = max_age_seconds(pair.access_token_expires_at, now_millis);
    let refresh_max_age = max_age_seconds(pair.refresh_token_expires_at, now_millis);
    Ok(vec![
        token_cookie(ACCESS_COOKIE, &pair.access_token, access_max_age, secure)?,
        token_cookie(REFRESH_COOKIE, &pair.refresh_token, refresh_max_age, secure)?,
        mirror_cookie(
            ACCESS_EXPIRY_COOKIE,
            pair.access_token_expires_at,
            access_max_age,
            secure,
        )?,
        mirror_cookie(
            REFRESH_EXPIRY_COOKIE,
            pair.refresh_token_expires_at,
            refresh_max_age,
            secure,
        )?,
    ])
}

/// `Set-Cookie` values that destroy a session: every session cookie emptied
/// with an immediately-past expiry. Safe to emit when no session exists.
#[must_use]
pub fn clear(secure: bool) -> Vec<HeaderValue> {
    [
        ACCESS_COOKIE,
        REFRESH_COOKIE,
        ACCESS_EXPIRY_COOKIE,
        REFRESH_EXPIRY_COOKIE,
    ]
    .iter()
    .filter_map(|name| {
        let mut cookie = format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
        if secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).ok()
    })
    .collect()
}

fn token_cookie(
    name: &str,
    value: &str,
    max_age: i64,
    secure: bool,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn mirror_cookie(
    name: &str,
    expires_at: i64,
    max_age: i64,
    secure: bool,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    // Readable by the UI, so no HttpOnly.
    let mut cookie = format!("{name}={expires_at}; Path=/; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn max_age_seconds(expires_at_millis: i64, now_millis: i64) -> i64 {
    ((expires_at_millis - now_millis) / 1000).max(0)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name {
            return Some(val.to_string());
        }
    }
    None
}
