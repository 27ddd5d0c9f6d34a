//! Caller-facing error taxonomy for the request pipeline.

use transport::TransportError;

/// Errors surfaced by `ApiClient` operations.
///
/// Only `401` responses enter the refresh protocol; every failure out of
/// that protocol maps to one of the auth variants below. Non-auth HTTP
/// errors (`403`, `500`, ...) are not errors at the pipeline level and come
/// back as plain responses.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network-level failure. Never retried by the pipeline.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// Authentication rejected outside the refresh protocol, e.g. a `401`
    /// from one of the exempt auth endpoints.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The refresh endpoint failed. Terminal for the caller that triggered
    /// the refresh and for every caller queued behind it.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// The replayed request failed authentication again. No further refresh
    /// is attempted for this request.
    #[error("authentication failed after replay: {0}")]
    AlreadyRetried(String),

    /// Credential store I/O or parse failure.
    #[error("credential store error: {0}")]
    Credential(String),

    /// A convenience wrapper (`login`, `authenticated_user`) got a non-2xx
    /// status it has no mapping for.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<storefront_auth::Error> for Error {
    fn from(err: storefront_auth::Error) -> Self {
        match err {
            storefront_auth::Error::RefreshFailed(msg) => Error::RefreshFailed(msg),
            storefront_auth::Error::CredentialParse(msg) => Error::Credential(msg),
            storefront_auth::Error::Io(msg) => Error::Credential(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_converts() {
        let err: Error = TransportError::Timeout("request timed out".to_string()).into();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn refresh_failure_maps_to_refresh_failed() {
        let err: Error = storefront_auth::Error::RefreshFailed("status 500".to_string()).into();
        assert!(matches!(err, Error::RefreshFailed(_)));
        assert_eq!(err.to_string(), "token refresh failed: status 500");
    }

    #[test]
    fn store_failures_map_to_credential() {
        let parse: Error = storefront_auth::Error::CredentialParse("bad json".to_string()).into();
        let io: Error = storefront_auth::Error::Io("permission denied".to_string()).into();
        assert!(matches!(parse, Error::Credential(_)));
        assert!(matches!(io, Error::Credential(_)));
    }
}
