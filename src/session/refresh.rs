//! Single-flight token refresh.
//!
//! Concurrent requests observing the same expired access token must not race
//! N refresh calls against the backend: the first successful rotation
//! invalidates the refresh token every other call is about to present. Each
//! refresh token therefore owns one flight slot; the first caller performs
//! the exchange while the rest await the slot and share its outcome.
//!
//! Slot bookkeeping mirrors the pending-login map pattern: entries carry a
//! creation instant and are purged after a short TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use super::{AuthError, TokenPair};
use crate::backend::BackendClient;

const DEFAULT_SLOT_TTL: Duration = Duration::from_secs(30);

#[derive(Clone)]
enum FlightOutcome {
    Rotated(TokenPair),
    Expired,
}

struct FlightSlot {
    outcome: Option<FlightOutcome>,
    created_at: Instant,
}

impl FlightSlot {
    fn new() -> Self {
        Self {
            outcome: None,
            created_at: Instant::now(),
        }
    }
}

/// Serializes refresh calls per refresh token and fans the outcome out to
/// every waiter.
pub struct RefreshFlights {
    slots: Mutex<HashMap<String, Arc<Mutex<FlightSlot>>>>,
    slot_ttl: Duration,
}

impl Default for RefreshFlights {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_TTL)
    }
}

impl RefreshFlights {
    #[must_use]
    pub fn new(slot_ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            slot_ttl,
        }
    }

    /// Refresh `pair` through the backend, collapsing concurrent callers for
    /// the same refresh token into one exchange.
    ///
    /// Successful rotations and terminal rejections are remembered for the
    /// slot TTL so late arrivals holding the already-consumed token observe
    /// the same outcome instead of burning a second exchange. Transient
    /// failures are not remembered; the next caller may retry.
    ///
    /// # Errors
    /// Returns `SessionExpired` when the refresh token is rejected, or the
    /// underlying backend error otherwise.
    pub async fn refresh(
        &self,
        backend: &BackendClient,
        pair: &TokenPair,
    ) -> Result<TokenPair, AuthError> {
        let slot = self.slot_for(&pair.refresh_token).await;
        let mut guard = slot.lock().await;
        match &guard.outcome {
            Some(FlightOutcome::Rotated(rotated)) => {
                debug!("Refresh already completed by a concurrent caller");
                Ok(rotated.clone())
            }
            Some(FlightOutcome::Expired) => Err(AuthError::SessionExpired),
            None => match backend.refresh(&pair.refresh_token).await {
                Ok(rotated) => {
                    guard.outcome = Some(FlightOutcome::Rotated(rotated.clone()));
                    Ok(rotated)
                }
                Err(AuthError::SessionExpired) => {
                    guard.outcome = Some(FlightOutcome::Expired);
                    Err(AuthError::SessionExpired)
                }
                Err(err) => Err(err),
            },
        }
    }

    async fn slot_for(&self, refresh_token: &str) -> Arc<Mutex<FlightSlot>> {
        let mut slots = self.slots.lock().await;
        let ttl = self.slot_ttl;
        slots.retain(|_, slot| {
            slot.try_lock()
                .map_or(true, |guard| guard.created_at.elapsed() < ttl)
        });
        slots
            .entry(refresh_token.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(FlightSlot::new())))
            .clone()
    }
}

impl std::fmt::Debug for RefreshFlights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshFlights")
            .field("slot_ttl", &self.slot_ttl)
            .finish_non_exhaustive()
    }
}
