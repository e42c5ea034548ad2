//! HTTP client wrapper for the admin API and the restriction endpoints.
//!
//! One generic call: build a request against a base origin, attach
//! `Content-Type: application/json` and (when the token store holds one) a
//! bearer token, fail on non-2xx, and decode the body into a typed record.
//! No retry, no timeout, no circuit breaking.
//!
//! The network sits behind [`Transport`]; production code uses
//! [`UreqTransport`], tests script responses with [`ScriptedTransport`].

pub mod types;

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::session::TokenStore;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Network-level failure (DNS, connection refused, reset).
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Failure of one API call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(#[from] TransportError),

    #[error("HTTP error! status: {status}")]
    Status { status: u16 },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status for non-2xx failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Executes one HTTP exchange.
///
/// Non-2xx statuses are responses, not errors; only failures to obtain a
/// response at all are `Err`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

// ---------------------------------------------------------------------------
// Request options
// ---------------------------------------------------------------------------

/// Per-call options: method, extra headers and body.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: "GET".to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post() -> Self {
        Self {
            method: "POST".to_string(),
            ..Self::get()
        }
    }

    /// Serialize `body` as the JSON request body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_string(body)?);
        Ok(self)
    }

    /// Add or override a header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// API client bound to one base origin.
#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenStore>,
}

impl HttpClient {
    pub fn new(
        base_url: &str,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Perform one call and decode the 2xx body into `T`.
    ///
    /// An empty 2xx body decodes as JSON `null`, so `T = ()` or
    /// `serde_json::Value` accept bodiless replies.
    pub fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let request = self.build_request(path, options);
        let response = self.transport.execute(&request)?;

        if !(200..300).contains(&response.status) {
            return Err(ApiError::Status {
                status: response.status,
            });
        }

        let body = if response.body.trim().is_empty() {
            "null"
        } else {
            response.body.as_str()
        };
        Ok(serde_json::from_str(body)?)
    }

    fn build_request(&self, path: &str, options: RequestOptions) -> HttpRequest {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(token) = self.tokens.get() {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        for (name, value) in options.headers {
            headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
            headers.push((name, value));
        }

        HttpRequest {
            method: options.method,
            url: format!("{}{}", self.base_url, path),
            headers,
            body: options.body,
        }
    }
}

// ---------------------------------------------------------------------------
// ureq transport
// ---------------------------------------------------------------------------

/// Blocking transport over `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        // "localhost" may resolve to ::1 first while the backend binds IPv4 only.
        let url = request.url.replace("://localhost", "://127.0.0.1");

        let mut req = ureq::request(&request.method, &url);
        for (name, value) in &request.headers {
            req = req.set(name, value);
        }

        let result = match &request.body {
            Some(body) => req.send_string(body),
            None => req.call(),
        };

        let resp = match result {
            Ok(resp) => resp,
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(ureq::Error::Transport(err)) => return Err(TransportError(err.to_string())),
        };

        let status = resp.status();
        let body = resp
            .into_string()
            .map_err(|e| TransportError(format!("failed to read response body: {e}")))?;
        Ok(HttpResponse { status, body })
    }
}

// ---------------------------------------------------------------------------
// Scripted transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Scripted {
    Respond(HttpResponse),
    Fail(String),
}

/// In-process transport answering from a table of scripted routes.
///
/// A route matches when the method is equal and the request URL (without
/// query) ends with the route path. Later routes shadow earlier ones, so a
/// test can change an endpoint's behaviour between calls. Unmatched requests
/// get a 404. Every request is recorded.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<(String, String, Scripted)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with a raw status and body.
    pub fn respond(&self, method: &str, path: &str, status: u16, body: impl Into<String>) {
        self.push(
            method,
            path,
            Scripted::Respond(HttpResponse {
                status,
                body: body.into(),
            }),
        );
    }

    /// Answer `method path` with `200` and a JSON body.
    pub fn respond_json(&self, method: &str, path: &str, body: &serde_json::Value) {
        self.respond(method, path, 200, body.to_string());
    }

    /// Fail `method path` at the network level.
    pub fn fail(&self, method: &str, path: &str, message: &str) {
        self.push(method, path, Scripted::Fail(message.to_string()));
    }

    /// Every request executed so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, method: &str, path: &str, outcome: Scripted) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((method.to_uppercase(), path.to_string(), outcome));
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let url = crate::utils::query::path_of(&request.url);
        let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = routes
            .iter()
            .rev()
            .find(|(method, path, _)| {
                method.eq_ignore_ascii_case(&request.method) && url.ends_with(path.as_str())
            })
            .map(|(_, _, outcome)| outcome.clone());

        match outcome {
            Some(Scripted::Respond(resp)) => Ok(resp),
            Some(Scripted::Fail(message)) => Err(TransportError(message)),
            None => Ok(HttpResponse {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryTokenStore;
    use serde_json::{Value, json};

    fn client(token: Option<&str>) -> (HttpClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new());
        let tokens: Arc<dyn TokenStore> = match token {
            Some(t) => Arc::new(MemoryTokenStore::with_token(t)),
            None => Arc::new(MemoryTokenStore::new()),
        };
        let client = HttpClient::new("http://api.test/", transport.clone(), tokens);
        (client, transport)
    }

    #[test]
    fn attaches_bearer_only_when_token_present() {
        let (with, transport) = client(Some("tok"));
        transport.respond_json("GET", "/ping", &json!({"ok": true}));
        let _: Value = with.fetch("/ping", RequestOptions::get()).unwrap();

        let (without, transport2) = client(None);
        transport2.respond_json("GET", "/ping", &json!({"ok": true}));
        let _: Value = without.fetch("/ping", RequestOptions::get()).unwrap();

        let req = &transport.requests()[0];
        assert_eq!(req.url, "http://api.test/ping");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("Authorization"), Some("Bearer tok"));

        let req = &transport2.requests()[0];
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.header("Authorization"), None);
    }

    #[test]
    fn non_2xx_carries_status() {
        let (client, transport) = client(None);
        transport.respond("GET", "/api/v1/companies", 503, "down");

        let err = client
            .fetch::<Value>("/api/v1/companies", RequestOptions::get())
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "HTTP error! status: 503");
    }

    #[test]
    fn transport_failure_propagates() {
        let (client, transport) = client(None);
        transport.fail("GET", "/x", "connection refused");

        let err = client.fetch::<Value>("/x", RequestOptions::get()).unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn unscripted_route_is_404() {
        let (client, _) = client(None);
        let err = client.fetch::<Value>("/nowhere", RequestOptions::get()).unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn malformed_body_is_decode_error() {
        let (client, transport) = client(None);
        transport.respond("GET", "/x", 200, "<html>");
        let err = client.fetch::<Value>("/x", RequestOptions::get()).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn empty_body_decodes_as_unit() {
        let (client, transport) = client(Some("t"));
        transport.respond("POST", "/api/v1/security/logout", 204, "");
        client
            .fetch::<()>("/api/v1/security/logout", RequestOptions::post())
            .unwrap();
        assert_eq!(transport.requests()[0].method, "POST");
    }

    #[test]
    fn option_headers_override_defaults_and_body_is_sent() {
        let (client, transport) = client(None);
        transport.respond_json("POST", "/echo", &json!({}));
        let opts = RequestOptions::post()
            .header("content-type", "application/json; charset=utf-8")
            .json(&json!({"line_user_id": "U1"}))
            .unwrap();
        let _: Value = client.fetch("/echo", opts).unwrap();

        let req = &transport.requests()[0];
        let content_types: Vec<_> = req
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .collect();
        assert_eq!(content_types.len(), 1);
        assert_eq!(req.header("Content-Type"), Some("application/json; charset=utf-8"));
        assert_eq!(req.body.as_deref(), Some(r#"{"line_user_id":"U1"}"#));
    }

    #[test]
    fn later_routes_shadow_earlier_ones() {
        let (client, transport) = client(None);
        transport.respond_json("GET", "/x", &json!({"n": 1}));
        transport.respond_json("GET", "/x", &json!({"n": 2}));
        let v: Value = client.fetch("/x", RequestOptions::get()).unwrap();
        assert_eq!(v["n"], 2);
    }
}
