//! HTTP client for the remote identity backend.
//!
//! The gateway consumes two endpoints: `POST /auth/login` for the credential
//! exchange and `POST /auth/refresh` for token rotation. Both return the full
//! token pair; the gateway never merges a partial result into stored state.

use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};
use url::Url;

use crate::APP_USER_AGENT;
use crate::session::{AuthError, TokenPair, User};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
// One bounded retry for transient failures only. Credential and session
// rejections are never retried.
const RETRY_BACKOFF: Duration = Duration::from_millis(300);

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    user: User,
    tokens: TokenPair,
}

/// Result of a successful credential exchange. Persisting the pair is the
/// caller's responsibility; the exchange itself has no cookie side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
}

impl BackendClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: Url) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Exchange credentials for a user and token pair.
    ///
    /// A 401 maps to `InvalidCredentials` without distinguishing unknown
    /// email from wrong password. Connection and timeout failures map to
    /// `NetworkFailure` so the caller can offer a retry instead of asking
    /// the user to re-enter credentials.
    ///
    /// # Errors
    /// Returns an `AuthError` describing the failure.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let url = self.endpoint("/auth/login")?;
        let response = self
            .client
            .post(url)
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|err| {
                error!("Login request failed: {err}");
                AuthError::NetworkFailure
            })?;

        match response.status() {
            status if status.is_success() => {
                let body: LoginResponse = response.json().await.map_err(|err| {
                    error!("Invalid login response: {err}");
                    AuthError::Backend("invalid login response".to_string())
                })?;
                Ok(LoginOutcome {
                    user: body.user,
                    tokens: body.tokens,
                })
            }
            StatusCode::UNAUTHORIZED => Err(AuthError::InvalidCredentials),
            status if status.is_server_error() => {
                error!("Login failed upstream: {status}");
                Err(AuthError::NetworkFailure)
            }
            status => {
                error!("Unexpected login status: {status}");
                Err(AuthError::Backend(format!("unexpected status {status}")))
            }
        }
    }

    /// Exchange a refresh token for a new pair, retrying once on transient
    /// failure. A rejected refresh token is terminal: `SessionExpired`, no
    /// retry.
    ///
    /// # Errors
    /// Returns an `AuthError` describing the failure.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        match self.refresh_once(refresh_token).await {
            Err(AuthError::NetworkFailure) => {
                debug!("Refresh hit a transient failure, retrying once");
                tokio::time::sleep(RETRY_BACKOFF).await;
                self.refresh_once(refresh_token).await
            }
            result => result,
        }
    }

    async fn refresh_once(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let url = self.endpoint("/auth/refresh")?;
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Refresh {refresh_token}"))
            .send()
            .await
            .map_err(|err| {
                error!("Refresh request failed: {err}");
                AuthError::NetworkFailure
            })?;

        match response.status() {
            status if status.is_success() => response.json().await.map_err(|err| {
                error!("Invalid refresh response: {err}");
                AuthError::Backend("invalid refresh response".to_string())
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::SessionExpired),
            status if status.is_server_error() => {
                error!("Refresh failed upstream: {status}");
                Err(AuthError::NetworkFailure)
            }
            status => {
                error!("Unexpected refresh status: {status}");
                Err(AuthError::Backend(format!("unexpected status {status}")))
            }
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        self.base_url.join(path).map_err(|err| {
            error!("Invalid backend endpoint {path}: {err}");
            AuthError::Backend(format!("invalid endpoint {path}"))
        })
    }
}
