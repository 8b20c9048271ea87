//! Upstream service - forwards prompts to the external chat endpoint.
//!
//! Failures never escape [`UpstreamClient::forward`]: they are turned into
//! an `{error, details}` payload that the proxy returns with status 200.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::{Value, json};

/// Fixed timeout for one upstream call.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Headers the upstream front-end sends.
const STATIC_HEADERS: [(&str, &str); 7] = [
    ("authority", "api.binjie.fun"),
    ("accept", "application/json, text/plain, */*"),
    ("accept-language", "en-US,en;q=0.9"),
    ("origin", "https://chat18.aichatos.xyz"),
    ("referer", "https://chat18.aichatos.xyz/"),
    ("user-agent", "Mozilla/5.0"),
    ("content-type", "application/json"),
];

const FAILURE_MESSAGE: &str = "Failed to fetch response from AI API";

/// Errors raised while building the client at startup.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamSetupError {
    #[error("invalid upstream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("upstream URL must use http or https, got {0}")]
    UnsupportedScheme(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// A failed upstream call.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Connection, timeout or body read failure.
    #[error("{0}")]
    Transport(String),

    /// Upstream answered with a non-2xx status.
    #[error("Request failed with status code {status}")]
    Status { status: u16, body: Value },
}

impl UpstreamError {
    /// The `{error, details}` object returned to the caller. `details` is
    /// the upstream's body when it sent one, otherwise the error message.
    pub fn into_payload(self) -> Value {
        let details = match self {
            UpstreamError::Status { ref body, .. } if is_truthy(body) => body.clone(),
            ref other => Value::String(other.to_string()),
        };

        json!({ "error": FAILURE_MESSAGE, "details": details })
    }
}

/// Body of the upstream request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamRequest {
    pub prompt: String,
    pub user_id: String,
    pub network: bool,
    pub system: String,
    pub without_context: bool,
    pub stream: bool,
}

impl UpstreamRequest {
    pub fn new(
        prompt: impl Into<String>,
        user_id: impl Into<String>,
        network: bool,
        without_context: bool,
        stream: bool,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            user_id: user_id.into(),
            network,
            system: String::new(),
            without_context,
            stream,
        }
    }
}

/// Client for the chat endpoint, shared by all requests.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    endpoint: url::Url,
}

impl UpstreamClient {
    /// Build the client for `endpoint` with the fixed headers and timeout.
    pub fn new(endpoint: &str) -> Result<Self, UpstreamSetupError> {
        let endpoint = url::Url::parse(endpoint)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(UpstreamSetupError::UnsupportedScheme(
                endpoint.scheme().to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in STATIC_HEADERS {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(UPSTREAM_TIMEOUT)
            .build()?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    /// Send `request` upstream and return what the caller should see: the
    /// upstream `result` on success, or an `{error, details}` payload.
    pub async fn forward(&self, request: &UpstreamRequest) -> Value {
        match self.send(request).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "upstream request failed");
                err.into_payload()
            }
        }
    }

    /// One attempt, no retries.
    async fn send(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        let body = parse_body(&text);

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(extract_result(body))
    }
}

/// JSON when the body parses, otherwise the raw text as a JSON string.
fn parse_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// The `result` field when it carries a value, otherwise the whole body.
fn extract_result(body: Value) -> Value {
    match body.get("result") {
        Some(result) if is_truthy(result) => result.clone(),
        _ => body,
    }
}

/// Empty strings, zero, false and null count as "no value".
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Random 16 hex character session id for callers that send no `userId`.
pub fn generate_user_id() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes)
}
