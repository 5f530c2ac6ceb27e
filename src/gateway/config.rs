//! Gateway configuration and shared request state.

use secrecy::SecretString;
use std::time::Duration;
use url::Url;

use crate::backend::BackendClient;
use crate::gateway::routes::RouteTable;
use crate::session::claims::ClaimsDecoder;
use crate::session::refresh::RefreshFlights;

const DEFAULT_REFRESH_SLOT_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    backend_url: Url,
    token_secret: SecretString,
    public_base_url: String,
    refresh_slot_ttl: Duration,
}

impl GatewayConfig {
    #[must_use]
    pub fn new(backend_url: Url, token_secret: SecretString, public_base_url: String) -> Self {
        Self {
            backend_url,
            token_secret,
            public_base_url,
            refresh_slot_ttl: DEFAULT_REFRESH_SLOT_TTL,
        }
    }

    #[must_use]
    pub fn with_refresh_slot_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_slot_ttl = ttl;
        self
    }

    #[must_use]
    pub fn backend_url(&self) -> &Url {
        &self.backend_url
    }

    #[must_use]
    pub fn token_secret(&self) -> &SecretString {
        &self.token_secret
    }

    #[must_use]
    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    /// Only mark cookies secure when the app is served over HTTPS.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.public_base_url.starts_with("https://")
    }

    #[must_use]
    pub fn refresh_slot_ttl(&self) -> Duration {
        self.refresh_slot_ttl
    }
}

/// Per-process gateway state shared across requests. Everything here is
/// immutable after startup except the refresh flights, which own their own
/// synchronization.
#[derive(Debug)]
pub struct GatewayState {
    config: GatewayConfig,
    routes: RouteTable,
    decoder: ClaimsDecoder,
    backend: BackendClient,
    flights: RefreshFlights,
}

impl GatewayState {
    /// # Errors
    /// Returns an error if the backend HTTP client cannot be constructed.
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let decoder = ClaimsDecoder::new(config.token_secret());
        let backend = BackendClient::new(config.backend_url().clone())?;
        let flights = RefreshFlights::new(config.refresh_slot_ttl());
        Ok(Self {
            config,
            routes: RouteTable::default(),
            decoder,
            backend,
            flights,
        })
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    #[must_use]
    pub fn decoder(&self) -> &ClaimsDecoder {
        &self.decoder
    }

    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    #[must_use]
    pub fn flights(&self) -> &RefreshFlights {
        &self.flights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str) -> GatewayConfig {
        GatewayConfig::new(
            Url::parse("http://backend.internal:4000").expect("url"),
            SecretString::from("secret".to_string()),
            base.to_string(),
        )
    }

    #[test]
    fn cookie_secure_follows_public_scheme() {
        assert!(config("https://ledger.app").cookie_secure());
        assert!(!config("http://localhost:3000").cookie_secure());
    }

    #[test]
    fn refresh_slot_ttl_is_configurable() {
        let c = config("http://localhost:3000").with_refresh_slot_ttl(Duration::from_secs(5));
        assert_eq!(c.refresh_slot_ttl(), Duration::from_secs(5));
    }
}
