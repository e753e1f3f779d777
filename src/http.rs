//! Authenticated HTTP request layer shared by both API clients.
//!
//! Everything goes through a single `request` primitive: credential
//! injection, query assembly, rate-limit retries with exponential
//! backoff, and normalization of transport and application failures
//! into one `HttpError` shape. The transport and the backoff sleeps sit
//! behind traits so the retry contract is testable without a network.

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default number of additional attempts after an HTTP 429.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Failure shape for every remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// Required credential missing or request unbuildable. Detected
    /// before any network I/O; status 0.
    Config(String),
    /// Network-level failure (DNS, connection refused, timeout);
    /// status 0.
    Transport(String),
    /// Non-2xx HTTP response after any applicable retries. Carries the
    /// real status code and the server's message when extractable.
    Remote { status: u16, message: String },
}

impl HttpError {
    /// HTTP status code for this failure; 0 when no response exists.
    pub fn status(&self) -> u16 {
        match self {
            HttpError::Config(_) | HttpError::Transport(_) => 0,
            HttpError::Remote { status, .. } => *status,
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::Config(msg) => write!(f, "configuration error: {}", msg),
            HttpError::Transport(msg) => write!(f, "transport error: {}", msg),
            HttpError::Remote { status, message } => write!(f, "HTTP {}: {}", status, message),
        }
    }
}

impl std::error::Error for HttpError {}

/// A request ready for the transport: fully resolved URL, headers, and
/// an optional JSON body.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// A fully-drained HTTP response. Transports must consume the body
/// before returning so the connection can be reused across retries.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Parsed numeric `Retry-After` header, in seconds.
    pub retry_after: Option<u64>,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes one prepared request. Implemented by the reqwest-backed
/// production transport and by recording doubles in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, HttpError>;
}

/// Backoff sleep seam, injectable so tests can record delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production transport over a shared reqwest client.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, HttpError> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        // Always read the body, even on 429, so the connection is
        // returned to the pool before the next attempt.
        let body = response
            .text()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// Sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How the credential is attached to requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>` — the Agentverse hosting API
    /// requires the case-sensitive "Bearer" prefix.
    Bearer,
    /// `X-API-Key: <key>` — the AgentLaunch backend.
    ApiKey,
}

/// Whether a call can proceed without a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    /// Fail with a configuration error before any I/O when absent.
    Required,
    /// Attach the credential when present, proceed without otherwise.
    Optional,
}

/// Authenticated JSON client bound to one base URL and auth scheme.
pub struct HttpClient {
    base_url: String,
    scheme: AuthScheme,
    credential: Option<String>,
    max_retries: u32,
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
}

impl HttpClient {
    pub fn new(base_url: &str, scheme: AuthScheme, credential: Option<String>) -> Self {
        Self::with_transport(
            base_url,
            scheme,
            credential,
            Arc::new(ReqwestTransport::new()),
            Arc::new(TokioSleeper),
        )
    }

    /// Construct with explicit transport and sleeper. Used by tests to
    /// drive the retry contract deterministically.
    pub fn with_transport(
        base_url: &str,
        scheme: AuthScheme,
        credential: Option<String>,
        transport: Arc<dyn Transport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            scheme,
            credential,
            max_retries: DEFAULT_MAX_RETRIES,
            transport,
            sleeper,
        }
    }

    /// Override the retry budget for 429 responses.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    fn build_url(
        &self,
        path: &str,
        query: &[(&str, Option<String>)],
    ) -> Result<String, HttpError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| HttpError::Config(format!("invalid URL for `{}`: {}", path, e)))?;

        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                // Absent values are omitted entirely, never serialized
                // as an empty or literal placeholder string.
                if let Some(value) = value {
                    pairs.append_pair(name, value);
                }
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        Ok(url.to_string())
    }

    fn auth_headers(&self, mode: CredentialMode) -> Result<Vec<(String, String)>, HttpError> {
        match (&self.credential, mode) {
            (Some(key), _) => Ok(vec![match self.scheme {
                AuthScheme::Bearer => ("Authorization".to_string(), format!("Bearer {}", key)),
                AuthScheme::ApiKey => ("X-API-Key".to_string(), key.clone()),
            }]),
            (None, CredentialMode::Optional) => Ok(Vec::new()),
            (None, CredentialMode::Required) => Err(HttpError::Config(
                "missing API credential (set AGENTVERSE_API_KEY or pass an explicit key)"
                    .to_string(),
            )),
        }
    }

    /// Execute one request, retrying on HTTP 429 with exponential
    /// backoff (1s, 2s, 4s, ...) unless the response carries a numeric
    /// `Retry-After` header, which overrides the delay for that
    /// attempt. When the retry budget is exhausted the final 429 is
    /// returned as an ordinary remote failure.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, Option<String>)],
        body: Option<&Value>,
        mode: CredentialMode,
    ) -> Result<Value, HttpError> {
        let headers = self.auth_headers(mode)?;
        let prepared = PreparedRequest {
            method: method.clone(),
            url: self.build_url(path, query)?,
            headers,
            body: body.cloned(),
        };

        let mut attempt = 0u32;
        loop {
            tracing::debug!("{} {} (attempt {})", method, prepared.url, attempt + 1);
            let response = self.transport.execute(&prepared).await?;

            if response.status == 429 && attempt < self.max_retries {
                let delay = response
                    .retry_after
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| Duration::from_millis(1000u64 << attempt));
                tracing::warn!(
                    "rate limited on {} {}, retrying in {:?}",
                    method,
                    prepared.url,
                    delay
                );
                self.sleeper.sleep(delay).await;
                attempt += 1;
                continue;
            }

            return Self::finalize(response);
        }
    }

    /// `request` plus deserialization into a typed response.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, Option<String>)],
        body: Option<&Value>,
        mode: CredentialMode,
    ) -> Result<T, HttpError> {
        let value = self.request(method, path, query, body, mode).await?;
        serde_json::from_value(value)
            .map_err(|e| HttpError::Transport(format!("unexpected response shape: {}", e)))
    }

    fn finalize(response: RawResponse) -> Result<Value, HttpError> {
        if response.is_success() {
            if response.body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&response.body)
                .map_err(|e| HttpError::Transport(format!("invalid JSON in response: {}", e)));
        }

        Err(HttpError::Remote {
            status: response.status,
            message: extract_error_message(&response.body, response.status),
        })
    }
}

/// Pull the server-supplied error message out of a failure body. Falls
/// back to the raw body, then to the bare status code.
fn extract_error_message(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value
            .get("message")
            .and_then(|v| v.as_str())
            .or_else(|| value.get("error").and_then(|v| v.as_str()))
        {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status)
    } else {
        trimmed.to_string()
    }
}

/// Normalize a list response into its items. Some endpoints return a
/// bare array, others wrap it in an `items` or `data` field; callers
/// never see the difference.
pub fn normalize_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("items")
            .or_else(|| map.get("data"))
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport double that replays scripted responses and records
    /// every request it receives.
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<RawResponse, HttpError>>>,
        pub calls: Mutex<Vec<PreparedRequest>>,
    }

    impl ScriptedTransport {
        pub fn new(responses: Vec<Result<RawResponse, HttpError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, HttpError> {
            self.calls.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("transport double ran out of scripted responses")
        }
    }

    /// Sleeper double that records requested delays without waiting.
    pub struct RecordingSleeper {
        pub sleeps: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        pub fn new() -> Self {
            Self {
                sleeps: Mutex::new(Vec::new()),
            }
        }

        pub fn recorded(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    pub fn ok(body: &str) -> Result<RawResponse, HttpError> {
        Ok(RawResponse {
            status: 200,
            retry_after: None,
            body: body.to_string(),
        })
    }

    pub fn status(status: u16, body: &str) -> Result<RawResponse, HttpError> {
        Ok(RawResponse {
            status,
            retry_after: None,
            body: body.to_string(),
        })
    }

    pub fn rate_limited(retry_after: Option<u64>) -> Result<RawResponse, HttpError> {
        Ok(RawResponse {
            status: 429,
            retry_after,
            body: "{\"message\":\"rate limit exceeded\"}".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use serde_json::json;

    fn client_with(
        transport: Arc<ScriptedTransport>,
        sleeper: Arc<RecordingSleeper>,
        credential: Option<&str>,
    ) -> HttpClient {
        HttpClient::with_transport(
            "https://api.example/v1",
            AuthScheme::Bearer,
            credential.map(|s| s.to_string()),
            transport,
            sleeper,
        )
    }

    #[tokio::test]
    async fn retry_succeeds_after_rate_limits() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            rate_limited(None),
            rate_limited(None),
            ok("{\"ok\":true}"),
        ]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let client = client_with(transport.clone(), sleeper.clone(), Some("key"));

        let value = client
            .request(Method::GET, "/thing", &[], None, CredentialMode::Required)
            .await
            .unwrap();

        assert_eq!(value, json!({"ok": true}));
        assert_eq!(transport.call_count(), 3);
        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }

    #[tokio::test]
    async fn retry_after_header_overrides_backoff() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            rate_limited(Some(7)),
            ok("{}"),
        ]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let client = client_with(transport.clone(), sleeper.clone(), Some("key"));

        client
            .request(Method::GET, "/thing", &[], None, CredentialMode::Required)
            .await
            .unwrap();

        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(7)]);
    }

    #[tokio::test]
    async fn retry_exhaustion_returns_final_429() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            rate_limited(None),
            rate_limited(None),
            rate_limited(None),
            rate_limited(None),
        ]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let client = client_with(transport.clone(), sleeper.clone(), Some("key"));

        let err = client
            .request(Method::GET, "/thing", &[], None, CredentialMode::Required)
            .await
            .unwrap_err();

        assert_eq!(err.status(), 429);
        // max_retries retries plus the original attempt.
        assert_eq!(transport.call_count(), DEFAULT_MAX_RETRIES as usize + 1);
        assert_eq!(
            sleeper.recorded(),
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000),
            ]
        );
    }

    #[tokio::test]
    async fn query_none_values_omitted() {
        let transport = Arc::new(ScriptedTransport::new(vec![ok("[]")]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let client = client_with(transport.clone(), sleeper, Some("key"));

        client
            .request(
                Method::GET,
                "/agents",
                &[
                    ("limit", Some("5".to_string())),
                    ("cursor", None),
                    ("q", Some("a b".to_string())),
                ],
                None,
                CredentialMode::Required,
            )
            .await
            .unwrap();

        let calls = transport.calls.lock().unwrap();
        let url = &calls[0].url;
        assert!(url.contains("limit=5"));
        assert!(url.contains("q=a+b") || url.contains("q=a%20b"));
        assert!(!url.contains("cursor"));
        assert!(!url.contains("undefined"));
    }

    #[tokio::test]
    async fn no_query_leaves_url_bare() {
        let transport = Arc::new(ScriptedTransport::new(vec![ok("[]")]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let client = client_with(transport.clone(), sleeper, Some("key"));

        client
            .request(
                Method::GET,
                "/agents",
                &[("cursor", None)],
                None,
                CredentialMode::Required,
            )
            .await
            .unwrap();

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls[0].url, "https://api.example/v1/agents");
    }

    #[tokio::test]
    async fn required_credential_missing_fails_before_io() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let client = client_with(transport.clone(), sleeper, None);

        let err = client
            .request(Method::GET, "/thing", &[], None, CredentialMode::Required)
            .await
            .unwrap_err();

        assert!(matches!(err, HttpError::Config(_)));
        assert_eq!(err.status(), 0);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn optional_credential_attached_only_when_present() {
        let transport = Arc::new(ScriptedTransport::new(vec![ok("{}"), ok("{}")]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let anon = client_with(transport.clone(), sleeper.clone(), None);

        anon.request(Method::GET, "/thing", &[], None, CredentialMode::Optional)
            .await
            .unwrap();

        let authed = client_with(transport.clone(), sleeper, Some("secret"));
        authed
            .request(Method::GET, "/thing", &[], None, CredentialMode::Optional)
            .await
            .unwrap();

        let calls = transport.calls.lock().unwrap();
        assert!(calls[0].headers.is_empty());
        assert_eq!(
            calls[1].headers,
            vec![("Authorization".to_string(), "Bearer secret".to_string())]
        );
    }

    #[tokio::test]
    async fn remote_error_message_extracted() {
        let transport = Arc::new(ScriptedTransport::new(vec![status(
            404,
            "{\"message\":\"agent not found\"}",
        )]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let client = client_with(transport, sleeper, Some("key"));

        let err = client
            .request(Method::GET, "/thing", &[], None, CredentialMode::Required)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            HttpError::Remote {
                status: 404,
                message: "agent not found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn remote_error_falls_back_to_raw_body() {
        let transport = Arc::new(ScriptedTransport::new(vec![status(500, "boom")]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let client = client_with(transport, sleeper, Some("key"));

        let err = client
            .request(Method::GET, "/thing", &[], None, CredentialMode::Required)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            HttpError::Remote {
                status: 500,
                message: "boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn empty_success_body_parses_to_null() {
        let transport = Arc::new(ScriptedTransport::new(vec![ok("")]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let client = client_with(transport, sleeper, Some("key"));

        let value = client
            .request(Method::POST, "/start", &[], None, CredentialMode::Required)
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn normalize_items_handles_all_envelopes() {
        assert_eq!(
            normalize_items(json!([{"a": 1}])),
            vec![json!({"a": 1})]
        );
        assert_eq!(
            normalize_items(json!({"items": [{"a": 1}]})),
            vec![json!({"a": 1})]
        );
        assert_eq!(
            normalize_items(json!({"data": [{"a": 1}]})),
            vec![json!({"a": 1})]
        );
        assert_eq!(normalize_items(json!({"count": 3})), Vec::<Value>::new());
        assert_eq!(normalize_items(json!("nope")), Vec::<Value>::new());
    }

    #[test]
    fn error_message_extraction_prefers_message_then_error() {
        assert_eq!(
            extract_error_message("{\"message\":\"m\",\"error\":\"e\"}", 400),
            "m"
        );
        assert_eq!(extract_error_message("{\"error\":\"e\"}", 400), "e");
        assert_eq!(extract_error_message("", 502), "HTTP 502");
    }
}
