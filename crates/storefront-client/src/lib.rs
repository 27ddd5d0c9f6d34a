//! Authenticated storefront API client
//!
//! Wraps every outbound request in the credential-refresh protocol: attach
//! the stored bearer token, execute, and on a 401 coordinate a single
//! refresh shared by all concurrent callers before replaying the request
//! exactly once. Refresh failure ends the session for every waiter at once.
//!
//! Request lifecycle:
//! 1. `ApiClient::send()` attaches the stored credential and executes
//! 2. A 401 on a regular endpoint routes into `RefreshCoordinator`
//! 3. The first caller drives the refresh call; later callers queue
//! 4. Success fans the new credential out and each request replays once
//! 5. Failure resolves every waiter to `Error::RefreshFailed`, clears the
//!    store, and fires the best-effort logout call
//! 6. `SessionEvents` tells the embedding application when the session
//!    refreshed or ended

pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod metrics;

pub use client::{ApiClient, LoginOutcome};
pub use config::Config;
pub use coordinator::RefreshCoordinator;
pub use error::{Error, Result};
pub use events::{LogoutReason, SessionEvent, SessionEvents};
