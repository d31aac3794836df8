//! HTTP transport for the notes API.
//!
//! This module wraps every request the client makes:
//! - Paths are resolved against the configured base URL
//! - Every request is bounded by a timeout
//! - Failures are classified into `TransportError` kinds
//!
//! Plain reads carry no custom headers. A GET with only safelisted headers is
//! a "simple request" and never triggers a CORS pre-flight, so reads and the
//! reachability check keep working against a server whose CORS policy rejects
//! pre-flights. Only writes set `Content-Type` and `Accept`.

use std::sync::Mutex;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::config::Config;
use crate::error::{NotesError, NotesResult, TransportError, TransportErrorKind};

const JSON_MIME: &str = "application/json";

/// Percent-encode a query value, leaving commas readable so a comma-joined
/// list stays a list on the wire.
pub fn encode_query_value(value: &str) -> String {
    urlencoding::encode(value).replace("%2C", ",")
}

/// Check if an error message looks like a browser cross-origin rejection.
///
/// Fetch-based clients report CORS failures only through their message text.
pub fn looks_like_cors(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("cors") || lower.contains("cross-origin") || lower.contains("failed to fetch")
}

fn classify(err: &reqwest::Error) -> TransportError {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }

    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_decode() {
        TransportErrorKind::Decode
    } else if looks_like_cors(&message) {
        TransportErrorKind::Cors
    } else {
        TransportErrorKind::Network
    };

    TransportError::new(kind, message)
}

/// HTTP transport bound to one API base URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport from configuration
    pub fn new(config: &Config) -> NotesResult<Self> {
        Self::with_timeout(config.base_url(), config.request_timeout())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> NotesResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| NotesError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the full URL for a path and already-unencoded query parameters
    pub fn url(&self, path: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        if !params.is_empty() {
            let query: Vec<String> = params
                .iter()
                .map(|(key, value)| format!("{}={}", urlencoding::encode(key), encode_query_value(value)))
                .collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    /// Perform a request and return the parsed body.
    ///
    /// An empty 2xx body (e.g. 204 No Content) yields `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        params: &[(&str, &str)],
    ) -> Result<Value, TransportError> {
        let url = self.url(path, params);
        tracing::debug!("{} {}", method, url);

        let is_read = method == Method::GET || method == Method::HEAD;
        let mut builder: RequestBuilder = self.client.request(method.clone(), &url).timeout(self.timeout);

        if !is_read {
            builder = builder.header(CONTENT_TYPE, JSON_MIME).header(ACCEPT, JSON_MIME);
            if let Some(body) = body {
                tracing::trace!("Request body: {}", body);
                let bytes = serde_json::to_vec(body)
                    .map_err(|e| TransportError::new(TransportErrorKind::Decode, e.to_string()))?;
                builder = builder.body(bytes);
            }
        }

        let response = builder.send().await.map_err(|e| {
            let err = classify(&e);
            tracing::debug!("{} {} failed: {}", method, url, err);
            err
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| classify(&e))?;

        if !status.is_success() {
            tracing::debug!("{} {} -> {}: {}", method, url, status, text);
            let err = TransportError::http(status.as_u16(), text);
            if err.is_forbidden() {
                tracing::warn!(
                    "403 Forbidden from {}: the server's security or CSRF configuration is likely rejecting this client",
                    url
                );
            }
            return Err(err);
        }

        tracing::trace!("{} {} -> {}: {}", method, url, status, text);

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| TransportError {
            kind: TransportErrorKind::Decode,
            status: Some(status.as_u16()),
            body: Some(text),
            message: format!("invalid JSON in response: {}", e),
        })
    }

    pub async fn get(&self, path: &str) -> Result<Value, TransportError> {
        self.request(Method::GET, path, None, &[]).await
    }

    pub async fn get_with_query(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, TransportError> {
        self.request(Method::GET, path, None, params).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        self.request(Method::POST, path, Some(body), &[]).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        self.request(Method::PUT, path, Some(body), &[]).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), TransportError> {
        self.request(Method::DELETE, path, None, &[]).await.map(|_| ())
    }

    /// Check if the API answers a plain GET on `path` within `bound`.
    ///
    /// Any 2xx is online; any failure, timeout included, is offline.
    pub async fn is_reachable(&self, path: &str, bound: Duration) -> bool {
        let url = self.url(path, &[]);
        match self.client.get(&url).timeout(bound).send().await {
            Ok(response) => {
                let online = response.status().is_success();
                tracing::debug!("Reachability check {} -> {}", url, response.status());
                online
            }
            Err(e) => {
                let err = classify(&e);
                if err.kind == TransportErrorKind::Cors {
                    tracing::warn!("Reachability check blocked by CORS: {}", err);
                } else {
                    tracing::debug!("Reachability check failed: {}", err);
                }
                false
            }
        }
    }
}

/// Last known reachability of the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Checking,
    Online,
    Offline,
}

struct MonitorState {
    status: BackendStatus,
    generation: u64,
    cancel: Option<oneshot::Sender<()>>,
}

/// Runs reachability checks and owns the resulting status.
///
/// Starting a check cancels the one still outstanding, so two checks never
/// race to publish a status.
pub struct HealthMonitor {
    transport: HttpTransport,
    path: String,
    bound: Duration,
    state: Mutex<MonitorState>,
}

impl HealthMonitor {
    pub fn new(transport: HttpTransport, config: &Config) -> Self {
        Self::with_bound(transport, &config.endpoints().notes, config.health_timeout())
    }

    pub fn with_bound(transport: HttpTransport, path: &str, bound: Duration) -> Self {
        Self {
            transport,
            path: path.to_string(),
            bound,
            state: Mutex::new(MonitorState {
                status: BackendStatus::Checking,
                generation: 0,
                cancel: None,
            }),
        }
    }

    pub fn status(&self) -> BackendStatus {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).status
    }

    /// Run one reachability check.
    ///
    /// Returns the published status, or None if a newer check superseded this one.
    pub async fn check(&self) -> Option<BackendStatus> {
        let (tx, rx) = oneshot::channel();
        let generation = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(stale) = state.cancel.replace(tx) {
                let _ = stale.send(());
            }
            state.generation += 1;
            state.status = BackendStatus::Checking;
            state.generation
        };

        let online = tokio::select! {
            online = self.transport.is_reachable(&self.path, self.bound) => online,
            _ = rx => {
                tracing::debug!("Reachability check {} cancelled by a newer check", generation);
                return None;
            }
        };

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.generation != generation {
            return None;
        }
        state.cancel = None;
        state.status = if online {
            BackendStatus::Online
        } else {
            BackendStatus::Offline
        };
        tracing::info!("Backend is {:?}", state.status);
        Some(state.status)
    }
}
