//! Storefront credential management
//!
//! Credential model, persistent store, and the refresh endpoint call for the
//! storefront API client. This crate is a standalone library with no
//! dependency on the request pipeline — it can be tested and used
//! independently.
//!
//! Credential flow:
//! 1. Login (or an out-of-band grant) produces the first credential
//! 2. `CredentialStore::set()` stores it for subsequent requests
//! 3. The pipeline attaches the access token to each outbound call
//! 4. On an authentication failure the coordinator calls
//!    `refresh::refresh_credential()`
//! 5. The replacement credential is stored and fanned out to queued callers
//! 6. `CredentialStore::clear()` wipes state on logout or refresh failure

pub mod constants;
pub mod credential;
pub mod error;
pub mod refresh;

pub use constants::*;
pub use credential::{Credential, CredentialStore};
pub use error::{Error, Result};
pub use refresh::{RefreshResponse, refresh_credential};
