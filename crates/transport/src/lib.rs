//! Transport abstraction for outbound storefront API calls
//!
//! Defines the `Transport` trait that decouples the request pipeline from the
//! HTTP engine. ReqwestTransport performs real network calls; tests substitute
//! scripted transports to drive authentication-failure and refresh paths
//! deterministically.

pub mod reqwest;

pub use self::reqwest::ReqwestTransport;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors from transport operations (connection, timeout, response decode).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("client construction failed: {0}")]
    Client(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// HTTP method subset used by the storefront API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Uppercase wire name, for logging and engine dispatch.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// One outbound HTTP exchange: method, absolute URL, headers, optional body.
///
/// Built by callers and cloned per attempt by the pipeline, so a replay never
/// mutates the value the caller constructed.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set (or replace) the bearer authorization header.
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    /// Serialize `body` as the JSON request body and set the content type.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let raw = serde_json::to_vec(body)
            .map_err(|e| TransportError::InvalidRequest(format!("JSON body: {e}")))?;
        self.body = Some(raw);
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status, headers, and raw body of a completed exchange.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| TransportError::MalformedResponse(format!("JSON body: {e}")))
    }

    /// Body as UTF-8, lossy. Intended for error context, not parsing.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over the HTTP engine executing one exchange.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    /// Identifier for logging (e.g. "reqwest", "scripted")
    fn id(&self) -> &str;

    /// Perform the exchange. Transport-level failures (connect, timeout,
    /// body decode) are errors; any completed HTTP response, including 4xx
    /// and 5xx, is `Ok`.
    fn execute<'a>(
        &'a self,
        request: &'a Request,
    ) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_replaces_existing_authorization() {
        let request = Request::get("http://api.test/products")
            .bearer("stale")
            .bearer("fresh");
        assert_eq!(request.header_value("authorization"), Some("Bearer fresh"));
    }

    #[test]
    fn json_sets_body_and_content_type() {
        let request = Request::post("http://api.test/auth/login")
            .json(&serde_json::json!({"email": "a@b.c"}))
            .unwrap();
        assert_eq!(request.header_value("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["email"], "a@b.c");
    }

    #[test]
    fn response_json_rejects_garbage() {
        let response = Response {
            status: 200,
            headers: HashMap::new(),
            body: b"not json".to_vec(),
        };
        let err = response.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, TransportError::MalformedResponse(_)), "got: {err:?}");
    }

    #[test]
    fn success_range_is_2xx() {
        let mut response = Response {
            status: 204,
            headers: HashMap::new(),
            body: Vec::new(),
        };
        assert!(response.is_success());
        response.status = 401;
        assert!(!response.is_success());
        response.status = 500;
        assert!(!response.is_success());
    }

    #[test]
    fn method_wire_names() {
        assert_eq!(Method::Get.as_str(), "GET");
        assert_eq!(Method::Delete.as_str(), "DELETE");
    }
}
