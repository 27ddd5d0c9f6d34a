//! Credential refresh against the storefront token endpoint
//!
//! One interaction: `POST {base_url}/auth/refresh-token` with no body. The
//! stored refresh token, when present, travels as the bearer authorization;
//! cookie-based deployments satisfy the same contract through a transport
//! that carries the cookie. Every failure mode of the call collapses into
//! `Error::RefreshFailed` because the coordinator treats them identically:
//! terminal for the caller and every queued waiter.

use common::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use transport::{Request, Transport};

use crate::constants::REFRESH_PATH;
use crate::credential::Credential;
use crate::error::{Error, Result};

/// Success body of the refresh endpoint.
///
/// `refreshToken` is optional: backends that rotate refresh credentials
/// return a replacement, cookie-based backends omit the field entirely.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Call the refresh endpoint and build the replacement credential.
///
/// A transport failure, non-2xx status, unparseable body, or missing/empty
/// `accessToken` is a refresh failure. When the response omits a rotated
/// refresh token the current one is carried over, so a later refresh can
/// still present it.
pub async fn refresh_credential(
    transport: &dyn Transport,
    base_url: &str,
    current: Option<&Credential>,
) -> Result<Credential> {
    let mut request = Request::post(format!("{base_url}{REFRESH_PATH}"));
    if let Some(refresh) = current.and_then(|c| c.refresh.as_ref()) {
        request = request.bearer(refresh.expose());
    }

    let response = transport
        .execute(&request)
        .await
        .map_err(|e| Error::RefreshFailed(format!("refresh request failed: {e}")))?;

    if !response.is_success() {
        warn!(status = response.status, "refresh endpoint rejected the credential");
        return Err(Error::RefreshFailed(format!(
            "refresh endpoint returned {}: {}",
            response.status,
            response.text()
        )));
    }

    let body: RefreshResponse = response
        .json()
        .map_err(|e| Error::RefreshFailed(format!("invalid refresh response: {e}")))?;

    if body.access_token.is_empty() {
        return Err(Error::RefreshFailed(
            "refresh response carried an empty accessToken".into(),
        ));
    }

    debug!(
        rotated_refresh = body.refresh_token.is_some(),
        "obtained refreshed credential"
    );

    let refresh = body
        .refresh_token
        .map(SecretString::from)
        .or_else(|| current.and_then(|c| c.refresh.clone()));

    Ok(Credential {
        access: SecretString::from(body.access_token),
        refresh,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use transport::{Response, TransportError};

    use super::*;

    /// Transport that replays queued results and records every request.
    struct ScriptedTransport {
        results: Mutex<Vec<transport::Result<Response>>>,
        seen: Mutex<Vec<Request>>,
    }

    impl ScriptedTransport {
        fn replying(results: Vec<transport::Result<Response>>) -> Self {
            Self {
                results: Mutex::new(results),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<Request> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn id(&self) -> &str {
            "scripted"
        }

        fn execute<'a>(
            &'a self,
            request: &'a Request,
        ) -> Pin<Box<dyn Future<Output = transport::Result<Response>> + Send + 'a>> {
            self.seen.lock().unwrap().push(request.clone());
            let result = self.results.lock().unwrap().remove(0);
            Box::pin(async move { result })
        }
    }

    fn json_response(status: u16, body: serde_json::Value) -> Response {
        Response {
            status,
            headers: HashMap::new(),
            body: serde_json::to_vec(&body).unwrap(),
        }
    }

    #[test]
    fn refresh_response_parses_camel_case() {
        let body = r#"{"accessToken":"T2","refreshToken":"R2"}"#;
        let parsed: RefreshResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.access_token, "T2");
        assert_eq!(parsed.refresh_token.as_deref(), Some("R2"));

        let without_rotation: RefreshResponse =
            serde_json::from_str(r#"{"accessToken":"T2"}"#).unwrap();
        assert!(without_rotation.refresh_token.is_none());
    }

    #[tokio::test]
    async fn success_returns_replacement_credential() {
        let transport = ScriptedTransport::replying(vec![Ok(json_response(
            200,
            serde_json::json!({"accessToken": "T2", "refreshToken": "R2"}),
        ))]);
        let current = Credential::with_refresh("T1", "R1");

        let credential = refresh_credential(&transport, "http://api.test", Some(&current))
            .await
            .unwrap();

        assert_eq!(credential.access.expose(), "T2");
        assert_eq!(credential.refresh.unwrap().expose(), "R2");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://api.test/auth/refresh-token");
        assert_eq!(requests[0].header_value("authorization"), Some("Bearer R1"));
        assert!(requests[0].body.is_none());
    }

    #[tokio::test]
    async fn missing_rotation_keeps_current_refresh_token() {
        let transport = ScriptedTransport::replying(vec![Ok(json_response(
            200,
            serde_json::json!({"accessToken": "T2"}),
        ))]);
        let current = Credential::with_refresh("T1", "R1");

        let credential = refresh_credential(&transport, "http://api.test", Some(&current))
            .await
            .unwrap();

        assert_eq!(credential.access.expose(), "T2");
        assert_eq!(credential.refresh.unwrap().expose(), "R1");
    }

    #[tokio::test]
    async fn absent_credential_sends_no_authorization() {
        let transport = ScriptedTransport::replying(vec![Ok(json_response(
            200,
            serde_json::json!({"accessToken": "T2"}),
        ))]);

        let credential = refresh_credential(&transport, "http://api.test", None)
            .await
            .unwrap();

        assert_eq!(credential.access.expose(), "T2");
        assert!(credential.refresh.is_none());
        assert!(transport.requests()[0].header_value("authorization").is_none());
    }

    #[tokio::test]
    async fn non_2xx_is_a_refresh_failure() {
        let transport = ScriptedTransport::replying(vec![Ok(json_response(
            500,
            serde_json::json!({"message": "session expired"}),
        ))]);

        let err = refresh_credential(&transport, "http://api.test", None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RefreshFailed(_)), "got: {err:?}");
        assert!(err.to_string().contains("500"), "got: {err}");
    }

    #[tokio::test]
    async fn empty_access_token_is_a_refresh_failure() {
        let transport = ScriptedTransport::replying(vec![Ok(json_response(
            200,
            serde_json::json!({"accessToken": ""}),
        ))]);

        let err = refresh_credential(&transport, "http://api.test", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RefreshFailed(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn unparseable_body_is_a_refresh_failure() {
        let transport = ScriptedTransport::replying(vec![Ok(Response {
            status: 200,
            headers: HashMap::new(),
            body: b"<html>gateway error</html>".to_vec(),
        })]);

        let err = refresh_credential(&transport, "http://api.test", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RefreshFailed(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn transport_error_is_a_refresh_failure() {
        let transport = ScriptedTransport::replying(vec![Err(TransportError::Timeout(
            "refresh call exceeded deadline".into(),
        ))]);

        let err = refresh_credential(&transport, "http://api.test", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RefreshFailed(_)), "got: {err:?}");
    }
}
