//! Single-flight credential refresh.
//!
//! Collapses concurrent refresh attempts into one network call:
//!
//! 1. The first caller to find no refresh in flight flips the flag and
//!    drives the call to the refresh endpoint
//! 2. Callers arriving while the flag is set park on a one-shot waiter,
//!    queued in arrival order
//! 3. When the call resolves, the flag flip and the queue drain happen
//!    under one lock acquisition, so no caller can observe a flipped flag
//!    with waiters still queued
//! 4. Success fans the replacement credential out to every waiter; failure
//!    fans out `RefreshFailed`, clears the store, and runs the logout side
//!    effect
//!
//! The coordinator is plain owned state. Construct one per client (tests
//! construct them directly); nothing here is process-global.

use std::sync::Arc;

use storefront_auth::{Credential, CredentialStore, LOGOUT_PATH, refresh_credential};
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info, warn};
use transport::{Request, Transport};

use crate::error::{Error, Result};
use crate::events::{LogoutReason, SessionEvent, SessionEvents};
use crate::metrics;

type Waiter = oneshot::Sender<Result<Credential>>;

/// Refresh-in-flight flag plus the queued waiters.
///
/// Invariant: `waiters` is non-empty only while `in_flight` is true.
#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<Waiter>,
}

/// What a caller entering [`RefreshCoordinator::refresh`] was assigned.
enum Role {
    Driver,
    Waiter(oneshot::Receiver<Result<Credential>>),
}

/// Serializes refresh so at most one call reaches the refresh endpoint.
pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
    events: SessionEvents,
    base_url: String,
    // Held only for the enqueue-or-claim and flip-and-drain sections,
    // never across the refresh call itself.
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<CredentialStore>,
        events: SessionEvents,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store,
            events,
            base_url: base_url.into(),
            state: Mutex::new(RefreshState::default()),
        }
    }

    /// Obtain a fresh credential, sharing any refresh already in flight.
    ///
    /// Exactly one concurrent caller performs the network call; the rest
    /// suspend until it resolves and receive the same outcome, in arrival
    /// order. On failure every caller gets [`Error::RefreshFailed`], the
    /// store is cleared, and the logout side effect runs once.
    pub async fn refresh(&self) -> Result<Credential> {
        let role = {
            let mut state = self.state.lock().await;
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                debug!(queued = state.waiters.len(), "refresh in flight, waiting");
                metrics::record_queued_waiter();
                Role::Waiter(rx)
            } else {
                state.in_flight = true;
                Role::Driver
            }
        };

        match role {
            Role::Waiter(rx) => match rx.await {
                Ok(outcome) => outcome,
                Err(_) => Err(Error::RefreshFailed(
                    "refresh ended without an outcome".to_string(),
                )),
            },
            Role::Driver => {
                let outcome = self.request_refresh().await;

                // Flip the flag and take the queue in one critical section.
                let waiters = {
                    let mut state = self.state.lock().await;
                    state.in_flight = false;
                    std::mem::take(&mut state.waiters)
                };

                match &outcome {
                    Ok(credential) => {
                        info!(waiters = waiters.len(), "refresh succeeded");
                        metrics::record_refresh("success");
                        self.events.emit(SessionEvent::Refreshed);
                        for waiter in waiters {
                            let _ = waiter.send(Ok(credential.clone()));
                        }
                    }
                    Err(err) => {
                        warn!(waiters = waiters.len(), error = %err, "refresh failed");
                        metrics::record_refresh("failed");
                        let reason = err.to_string();
                        for waiter in waiters {
                            let _ = waiter.send(Err(Error::RefreshFailed(reason.clone())));
                        }
                        self.force_logout(LogoutReason::RefreshFailed).await;
                    }
                }

                outcome
            }
        }
    }

    /// The authoritative refresh call, bypassing the single-flight queue.
    ///
    /// Calls the refresh endpoint with the stored refresh credential and
    /// replaces the stored credential on success. Pipeline callers want
    /// [`refresh`](Self::refresh) instead.
    pub async fn request_refresh(&self) -> Result<Credential> {
        let current = self.store.get().await;
        let credential =
            refresh_credential(self.transport.as_ref(), &self.base_url, current.as_ref()).await?;
        self.store.set(credential.clone()).await?;
        debug!("stored refreshed credential");
        Ok(credential)
    }

    /// Logout side effect: clear the store, emit [`SessionEvent::LoggedOut`],
    /// and fire the best-effort logout call.
    ///
    /// The server-side revocation runs on a detached task so it can neither
    /// delay nor fail the local logout.
    pub async fn force_logout(&self, reason: LogoutReason) {
        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "failed to clear credential during logout");
        }
        metrics::record_logout(reason.label());
        self.events.emit(SessionEvent::LoggedOut { reason });

        let transport = Arc::clone(&self.transport);
        let url = format!("{}{}", self.base_url, LOGOUT_PATH);
        tokio::spawn(async move {
            let request = Request::post(url);
            if let Err(err) = transport.execute(&request).await {
                debug!(error = %err, "best-effort logout call failed");
            }
        });

        info!(reason = reason.label(), "logged out");
    }
}
