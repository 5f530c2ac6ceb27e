//! Session endpoints: login, logout, refresh, and session introspection.
//!
//! All session mutations happen here: handlers are the single write path for
//! the cookie-backed token pair, and every mutation replaces or clears the
//! whole pair at once.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

use crate::gateway::config::GatewayState;
use crate::session::{AuthError, TokenPair, User, cookies, now_millis};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub user: User,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub access_token_expires_at: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token_expires_at: i64,
    pub refresh_token_expires_at: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

// One generic message for every credential rejection; the backend's reason
// must not leak which field was wrong.
const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";
const BACKEND_UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable, please retry";

pub(crate) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn set_pair_cookies(response: &mut Response, values: Vec<HeaderValue>) {
    for value in values {
        response.headers_mut().append(SET_COOKIE, value);
    }
}

fn store_cookies(state: &GatewayState, pair: &TokenPair) -> Vec<HeaderValue> {
    cookies::store(pair, state.config().cookie_secure(), now_millis()).unwrap_or_else(|err| {
        // Tokens with header-invalid bytes never came from the backend.
        error!("Failed to build session cookies: {err}");
        cookies::clear(state.config().cookie_secure())
    })
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing or malformed fields", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 502, description = "Identity backend unavailable", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<GatewayState>>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return error_body(StatusCode::BAD_REQUEST, "Missing payload");
    };

    if request.email.is_empty() || request.password.is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "Email and password are required");
    }

    if !valid_email(&request.email) {
        return error_body(StatusCode::BAD_REQUEST, "Invalid email address");
    }

    match state.backend().login(&request.email, &request.password).await {
        Ok(outcome) => {
            debug!("Login succeeded for user {}", outcome.user.id);
            let mut response =
                (StatusCode::OK, Json(LoginResponse { user: outcome.user })).into_response();
            set_pair_cookies(&mut response, store_cookies(&state, &outcome.tokens));
            response
        }
        Err(AuthError::InvalidCredentials) => {
            error_body(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS_MESSAGE)
        }
        Err(AuthError::NetworkFailure) => {
            error_body(StatusCode::BAD_GATEWAY, BACKEND_UNAVAILABLE_MESSAGE)
        }
        Err(err) => {
            error!("Login failed: {err}");
            error_body(StatusCode::BAD_GATEWAY, BACKEND_UNAVAILABLE_MESSAGE)
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn logout(State(state): State<Arc<GatewayState>>) -> Response {
    // Idempotent: clears cookies whether or not a session exists.
    let mut response = StatusCode::NO_CONTENT.into_response();
    set_pair_cookies(
        &mut response,
        cookies::clear(state.config().cookie_secure()),
    );
    response
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Pair rotated", body = RefreshResponse),
        (status = 401, description = "Session expired", body = ErrorResponse),
        (status = 502, description = "Identity backend unavailable", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn refresh(State(state): State<Arc<GatewayState>>, headers: HeaderMap) -> Response {
    let cookie_state = cookies::CookieState::read(&headers);
    let Some(pair) = cookie_state.refreshable_pair() else {
        let mut response = error_body(StatusCode::UNAUTHORIZED, "No session");
        set_pair_cookies(
            &mut response,
            cookies::clear(state.config().cookie_secure()),
        );
        return response;
    };

    match state.flights().refresh(state.backend(), &pair).await {
        Ok(rotated) => rotated_response(&state, &rotated),
        Err(AuthError::SessionExpired) => {
            let mut response = error_body(StatusCode::UNAUTHORIZED, "Session expired");
            set_pair_cookies(
                &mut response,
                cookies::clear(state.config().cookie_secure()),
            );
            response
        }
        Err(AuthError::NetworkFailure) => {
            // Old pair stays intact and refresh-eligible.
            error_body(StatusCode::BAD_GATEWAY, BACKEND_UNAVAILABLE_MESSAGE)
        }
        Err(err) => {
            error!("Refresh failed: {err}");
            error_body(StatusCode::BAD_GATEWAY, BACKEND_UNAVAILABLE_MESSAGE)
        }
    }
}

fn rotated_response(state: &GatewayState, rotated: &TokenPair) -> Response {
    let mut response = (
        StatusCode::OK,
        Json(RefreshResponse {
            access_token_expires_at: rotated.access_token_expires_at,
            refresh_token_expires_at: rotated.refresh_token_expires_at,
        }),
    )
        .into_response();
    set_pair_cookies(&mut response, store_cookies(state, rotated));
    response
}

#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session"),
        (status = 502, description = "Identity backend unavailable", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn session(State(state): State<Arc<GatewayState>>, headers: HeaderMap) -> Response {
    let cookie_state = cookies::CookieState::read(&headers);

    // Live access token: answer from claims alone, no backend round-trip.
    if let Some(token) = cookie_state.access_token.as_deref() {
        if let Ok(claims) = state.decoder().decode(token) {
            let expires_at = cookie_state
                .access_token_expires_at
                .unwrap_or(claims.exp * 1000);
            return (
                StatusCode::OK,
                Json(SessionResponse {
                    user_id: claims.sub,
                    email: claims.email,
                    role: claims.role,
                    access_token_expires_at: expires_at,
                }),
            )
                .into_response();
        }
    }

    // Expired or absent access token: lazily rotate through the refresh
    // protocol before giving up on the session.
    let Some(pair) = cookie_state.refreshable_pair() else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match state.flights().refresh(state.backend(), &pair).await {
        Ok(rotated) => match state.decoder().decode(&rotated.access_token) {
            Ok(claims) => {
                let mut response = (
                    StatusCode::OK,
                    Json(SessionResponse {
                        user_id: claims.sub,
                        email: claims.email,
                        role: claims.role,
                        access_token_expires_at: rotated.access_token_expires_at,
                    }),
                )
                    .into_response();
                set_pair_cookies(&mut response, store_cookies(&state, &rotated));
                response
            }
            Err(err) => {
                error!("Backend issued an undecodable access token: {err}");
                let mut response = StatusCode::NO_CONTENT.into_response();
                set_pair_cookies(
                    &mut response,
                    cookies::clear(state.config().cookie_secure()),
                );
                response
            }
        },
        Err(AuthError::SessionExpired) => {
            let mut response = StatusCode::NO_CONTENT.into_response();
            set_pair_cookies(
                &mut response,
                cookies::clear(state.config().cookie_secure()),
            );
            response
        }
        Err(err) => {
            error!("Session refresh failed: {err}");
            error_body(StatusCode::BAD_GATEWAY, BACKEND_UNAVAILABLE_MESSAGE)
        }
    }
}
