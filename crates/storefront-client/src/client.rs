//! Authenticated request pipeline.
//!
//! Every outbound call follows the same lifecycle:
//!
//! 1. Attach the stored credential as bearer authorization
//! 2. Execute over the transport
//! 3. On a 401: exempt auth endpoints and already-replayed requests fail
//!    directly with the logout side effect; everything else goes through
//!    the refresh coordinator and replays exactly once with the
//!    replacement credential
//!
//! Non-401 responses, 4xx and 5xx included, resolve as plain responses.
//! Classifying those is the caller's business.

use std::sync::Arc;
use std::time::Instant;

use common::SecretString;
use serde::Serialize;
use storefront_auth::{
    AUTH_USER_PATH, Credential, CredentialStore, LOGIN_PATH, is_refresh_exempt,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use transport::{Request, ReqwestTransport, Response, Transport};
use uuid::Uuid;

use crate::config::Config;
use crate::coordinator::RefreshCoordinator;
use crate::error::{Error, Result};
use crate::events::{LogoutReason, SessionEvent, SessionEvents};
use crate::metrics;

/// The only status the pipeline treats as an authentication failure.
const AUTH_FAILURE_STATUS: u16 = 401;

/// Pipeline-internal view of one request: the caller's value plus the
/// replay marker. The marker lives here rather than on [`Request`], so the
/// caller's value is never mutated and a request reused across `send`
/// calls starts clean every time.
struct Attempt {
    request: Request,
    request_id: Uuid,
    retried: bool,
}

/// Result of a successful login call.
#[derive(Debug)]
pub struct LoginOutcome {
    /// Whether the response carried tokens that are now stored.
    pub credential_stored: bool,
    /// Full response payload (message, user, ...) for the embedding
    /// application.
    pub body: serde_json::Value,
}

/// Authenticated storefront API client.
///
/// Owns its transport, credential store, and refresh coordinator, so two
/// clients never share refresh state unless they share a store on purpose.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
    events: SessionEvents,
    base_url: String,
}

impl ApiClient {
    /// Build a client from configuration: reqwest-backed transport, and a
    /// file-backed credential store when `credentials.path` is set.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(config.timeout())?);
        let store = match &config.credentials.path {
            Some(path) => Arc::new(CredentialStore::load(path.clone()).await?),
            None => Arc::new(CredentialStore::in_memory()),
        };
        Ok(Self::from_parts(transport, store, config.normalized_base_url()))
    }

    /// Build a client over explicit collaborators. Tests inject scripted
    /// transports here; embedding applications can share a store between
    /// clients.
    pub fn from_parts(
        transport: Arc<dyn Transport>,
        store: Arc<CredentialStore>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        let events = SessionEvents::new();
        let coordinator = Arc::new(RefreshCoordinator::new(
            Arc::clone(&transport),
            Arc::clone(&store),
            events.clone(),
            base_url.clone(),
        ));
        Self {
            transport,
            store,
            coordinator,
            events,
            base_url,
        }
    }

    /// Receiver for session lifecycle events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// The credential store backing this client.
    pub fn credential_store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request through the authenticated pipeline.
    ///
    /// The stored credential, when present, is attached as the bearer
    /// authorization and replaces any authorization header already on
    /// `request`. A 401 routes through the refresh coordinator and the
    /// request replays exactly once with the credential the coordinator
    /// fanned out.
    pub async fn send(&self, request: Request) -> Result<Response> {
        let started = Instant::now();
        let mut attempt = Attempt {
            request,
            request_id: Uuid::new_v4(),
            retried: false,
        };
        let mut fanned_out: Option<Credential> = None;

        loop {
            let credential = match &fanned_out {
                Some(credential) => Some(credential.clone()),
                None => self.store.get().await,
            };
            let response = self.execute(&attempt, credential.as_ref()).await?;

            if response.status != AUTH_FAILURE_STATUS {
                metrics::record_request(
                    attempt.request.method.as_str(),
                    response.status,
                    started.elapsed().as_secs_f64(),
                );
                return Ok(response);
            }

            metrics::record_auth_failure();

            if is_refresh_exempt(&attempt.request.url) {
                warn!(
                    request_id = %attempt.request_id,
                    url = %attempt.request.url,
                    "auth endpoint rejected the credential"
                );
                self.coordinator
                    .force_logout(LogoutReason::AuthEndpointRejected)
                    .await;
                return Err(Error::Authentication(format!(
                    "authentication endpoint rejected the request: {}",
                    attempt.request.url
                )));
            }

            if attempt.retried {
                warn!(
                    request_id = %attempt.request_id,
                    url = %attempt.request.url,
                    "replayed request failed authentication again"
                );
                self.coordinator
                    .force_logout(LogoutReason::AlreadyRetried)
                    .await;
                return Err(Error::AlreadyRetried(format!(
                    "request to {} was rejected twice",
                    attempt.request.url
                )));
            }

            debug!(request_id = %attempt.request_id, "authentication failed, refreshing");
            attempt.retried = true;
            fanned_out = Some(self.coordinator.refresh().await?);
            metrics::record_replay();
        }
    }

    /// GET `path` (joined onto the base URL) through the pipeline.
    pub async fn get(&self, path: &str) -> Result<Response> {
        self.send(Request::get(format!("{}{}", self.base_url, path)))
            .await
    }

    /// POST `body` as JSON to `path` through the pipeline.
    pub async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let request = Request::post(format!("{}{}", self.base_url, path)).json(body)?;
        self.send(request).await
    }

    /// Authenticate with email and password.
    ///
    /// Tokens in the response body are stored as the session credential;
    /// cookie-session backends omit them and `credential_stored` comes back
    /// false. The login path is refresh-exempt, so a 401 here means the
    /// credentials were rejected, not that the session expired.
    pub async fn login(&self, email: &str, password: SecretString) -> Result<LoginOutcome> {
        let request = Request::post(format!("{}{}", self.base_url, LOGIN_PATH)).json(
            &serde_json::json!({ "email": email, "password": password.expose() }),
        )?;
        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(Error::UnexpectedStatus {
                status: response.status,
                body: response.text(),
            });
        }

        let body: serde_json::Value = response.json()?;
        let access = body
            .get("accessToken")
            .and_then(|value| value.as_str())
            .filter(|token| !token.is_empty());
        let credential_stored = match access {
            Some(access) => {
                let refresh = body
                    .get("refreshToken")
                    .and_then(|value| value.as_str())
                    .map(SecretString::from);
                self.store
                    .set(Credential {
                        access: SecretString::from(access),
                        refresh,
                    })
                    .await?;
                info!("stored credential from login response");
                true
            }
            None => {
                debug!("login response carried no tokens");
                false
            }
        };

        Ok(LoginOutcome {
            credential_stored,
            body,
        })
    }

    /// Voluntary logout. Clears the stored credential, emits
    /// [`SessionEvent::LoggedOut`], and fires the best-effort server call.
    /// Never fails; the local session is gone even when the network is.
    pub async fn logout(&self) {
        self.coordinator
            .force_logout(LogoutReason::UserRequested)
            .await;
    }

    /// Fetch the authenticated user. Participates in refresh and replay
    /// like any other request.
    pub async fn authenticated_user(&self) -> Result<serde_json::Value> {
        let request = Request::get(format!("{}{}", self.base_url, AUTH_USER_PATH));
        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(Error::UnexpectedStatus {
                status: response.status,
                body: response.text(),
            });
        }
        let body: serde_json::Value = response.json()?;
        Ok(body.get("user").cloned().unwrap_or(serde_json::Value::Null))
    }

    /// One transport exchange: clone the caller's request, attach the
    /// credential, execute.
    async fn execute(&self, attempt: &Attempt, credential: Option<&Credential>) -> Result<Response> {
        let mut request = attempt.request.clone();
        if let Some(credential) = credential {
            request = request.bearer(credential.access.expose());
        }
        debug!(
            request_id = %attempt.request_id,
            method = request.method.as_str(),
            url = %request.url,
            authenticated = credential.is_some(),
            replay = attempt.retried,
            "sending request"
        );
        let response = self.transport.execute(&request).await?;
        debug!(
            request_id = %attempt.request_id,
            status = response.status,
            "received response"
        );
        Ok(response)
    }
}
