//! AgentLaunch backend client: token creation and agent tokenization.
//!
//! The backend wraps every response in a `{ success, message?, data }`
//! envelope and authenticates with `X-API-Key`. Pricing, bonding-curve
//! economics and graduation all live on the remote side; this client
//! only shapes requests and unwraps envelopes.

use reqwest::Method;
use serde_json::{Value, json};

use crate::hosting::truncate_chars;
use crate::http::{AuthScheme, CredentialMode, HttpClient, HttpError};

/// Maximum token name length accepted by the backend.
pub const MAX_TOKEN_NAME_LEN: usize = 32;

/// Maximum token symbol length accepted by the backend.
pub const MAX_TOKEN_SYMBOL_LEN: usize = 11;

/// Backend category id for AI/ML tokens.
pub const AI_CATEGORY_ID: u64 = 5;

/// Default chain: BSC testnet. Mainnet is 56.
pub const DEFAULT_CHAIN_ID: u64 = 97;

const DEFAULT_LOGO_URL: &str = "https://picsum.photos/400";

/// Parameters for creating a token. Name and symbol are truncated to
/// the backend caps before sending.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    pub name: String,
    pub symbol: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub chain_id: u64,
}

impl TokenRequest {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            description: None,
            logo: None,
            chain_id: DEFAULT_CHAIN_ID,
        }
    }
}

/// A created token, as reported by the backend. The backend is loose
/// about field names (`id` vs `token_id`, `symbol` vs `ticker`), so the
/// raw payload is kept and accessors normalize.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    raw: Value,
}

impl TokenInfo {
    pub fn from_value(raw: Value) -> Self {
        Self { raw }
    }

    pub fn name(&self) -> Option<&str> {
        self.raw.get("name").and_then(|v| v.as_str())
    }

    pub fn symbol(&self) -> Option<&str> {
        self.raw
            .get("symbol")
            .or_else(|| self.raw.get("ticker"))
            .and_then(|v| v.as_str())
    }

    /// Token identifier, normalized to a string whether the backend
    /// sent it as a number or a string, under either field name.
    pub fn token_id(&self) -> Option<String> {
        let id = self.raw.get("id").or_else(|| self.raw.get("token_id"))?;
        match id {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// Build the handoff link a human opens to deploy the token on-chain
/// with their own wallet. Pure templating; no signing happens here.
pub fn handoff_url(frontend_base: &str, token_id: &str) -> String {
    format!("{}/deploy/{}", frontend_base.trim_end_matches('/'), token_id)
}

/// Derive a symbol from a token name: alphanumerics only, uppercased,
/// capped at the backend symbol limit.
pub fn derive_ticker(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_TOKEN_SYMBOL_LEN)
        .collect::<String>()
        .to_uppercase()
}

/// Client for the AgentLaunch backend.
pub struct LaunchpadClient {
    http: HttpClient,
}

impl LaunchpadClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http: HttpClient::new(base_url, AuthScheme::ApiKey, api_key),
        }
    }

    pub fn from_client(http: HttpClient) -> Self {
        Self { http }
    }

    /// Create a token. Returns the backend's token record; the handoff
    /// link is derived from it via [`handoff_url`].
    pub async fn create_token(&self, request: &TokenRequest) -> Result<TokenInfo, HttpError> {
        let name = truncate_chars(&request.name, MAX_TOKEN_NAME_LEN);
        let body = json!({
            "name": name,
            "symbol": truncate_chars(&request.symbol, MAX_TOKEN_SYMBOL_LEN),
            "description": request
                .description
                .clone()
                .unwrap_or_else(|| format!("AI agent token: {}", name)),
            "category": { "id": AI_CATEGORY_ID },
            "logo": request.logo.clone().unwrap_or_else(|| DEFAULT_LOGO_URL.to_string()),
            "chainId": request.chain_id,
        });

        let value = self
            .http
            .request(
                Method::POST,
                "/api/agents/launch",
                &[],
                Some(&body),
                CredentialMode::Required,
            )
            .await?;

        Ok(TokenInfo::from_value(unwrap_envelope(value)?))
    }

    /// Tokenize an existing hosted agent.
    pub async fn tokenize_agent(
        &self,
        agent_address: &str,
        chain_id: u64,
    ) -> Result<TokenInfo, HttpError> {
        let body = json!({
            "agentAddress": agent_address,
            "image": DEFAULT_LOGO_URL,
            "chainId": chain_id,
        });

        let value = self
            .http
            .request(
                Method::POST,
                "/api/agents/tokenize",
                &[],
                Some(&body),
                CredentialMode::Required,
            )
            .await?;

        Ok(TokenInfo::from_value(unwrap_envelope(value)?))
    }
}

/// Unwrap the `{ success, message?, data }` envelope. An application
/// failure inside a 2xx response surfaces the server's message with the
/// real (successful) status code attached.
fn unwrap_envelope(value: Value) -> Result<Value, HttpError> {
    let success = value
        .get("success")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    if !success {
        let message = value
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
            .to_string();
        return Err(HttpError::Remote {
            status: 200,
            message,
        });
    }

    Ok(value.get("data").cloned().unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_support::*;
    use std::sync::Arc;

    fn client_over(transport: Arc<ScriptedTransport>) -> LaunchpadClient {
        LaunchpadClient::from_client(HttpClient::with_transport(
            "https://launchpad.test",
            AuthScheme::ApiKey,
            Some("lp-key".to_string()),
            transport,
            Arc::new(RecordingSleeper::new()),
        ))
    }

    #[tokio::test]
    async fn create_token_truncates_and_fills_defaults() {
        let transport = Arc::new(ScriptedTransport::new(vec![ok(
            "{\"success\":true,\"data\":{\"id\":42,\"name\":\"LongTokenName\",\"symbol\":\"LONGSYMBOL\"}}",
        )]));
        let client = client_over(transport.clone());

        let request = TokenRequest::new(
            "LongTokenNameThatGoesWellPastTheThirtyTwoCharacterCap",
            "SYMBOLTOOLONGFORCAP",
        );
        let token = client.create_token(&request).await.unwrap();
        assert_eq!(token.token_id().as_deref(), Some("42"));

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls[0].url, "https://launchpad.test/api/agents/launch");
        assert_eq!(
            calls[0].headers,
            vec![("X-API-Key".to_string(), "lp-key".to_string())]
        );

        let body = calls[0].body.as_ref().unwrap();
        assert_eq!(body["name"].as_str().unwrap().chars().count(), 32);
        assert_eq!(body["symbol"].as_str().unwrap().chars().count(), 11);
        assert_eq!(body["category"]["id"], 5);
        assert_eq!(body["chainId"], DEFAULT_CHAIN_ID);
        assert!(body["description"].as_str().unwrap().starts_with("AI agent token:"));
    }

    #[tokio::test]
    async fn envelope_failure_surfaces_server_message() {
        let transport = Arc::new(ScriptedTransport::new(vec![ok(
            "{\"success\":false,\"message\":\"symbol already exists\"}",
        )]));
        let client = client_over(transport);

        let err = client
            .create_token(&TokenRequest::new("My Coin", "MC"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            HttpError::Remote {
                status: 200,
                message: "symbol already exists".to_string()
            }
        );
    }

    #[tokio::test]
    async fn tokenize_agent_sends_agent_address() {
        let transport = Arc::new(ScriptedTransport::new(vec![ok(
            "{\"success\":true,\"data\":{\"token_id\":\"7\"}}",
        )]));
        let client = client_over(transport.clone());

        let token = client.tokenize_agent("agent1qxyz", 56).await.unwrap();
        assert_eq!(token.token_id().as_deref(), Some("7"));

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls[0].url, "https://launchpad.test/api/agents/tokenize");
        let body = calls[0].body.as_ref().unwrap();
        assert_eq!(body["agentAddress"], "agent1qxyz");
        assert_eq!(body["chainId"], 56);
    }

    #[test]
    fn handoff_url_is_frontend_deploy_path() {
        assert_eq!(
            handoff_url("https://launchpad.example", "42"),
            "https://launchpad.example/deploy/42"
        );
        assert_eq!(
            handoff_url("https://launchpad.example/", "42"),
            "https://launchpad.example/deploy/42"
        );
    }

    #[test]
    fn derive_ticker_strips_and_uppercases() {
        assert_eq!(derive_ticker("My Agent Coin"), "MYAGENTCOIN");
        assert_eq!(derive_ticker("hyper-fast trader 3000"), "HYPERFASTTR");
        assert_eq!(derive_ticker("x"), "X");
    }

    #[test]
    fn token_info_normalizes_id_fields() {
        let by_id = TokenInfo::from_value(serde_json::json!({"id": 9}));
        assert_eq!(by_id.token_id().as_deref(), Some("9"));

        let by_token_id = TokenInfo::from_value(serde_json::json!({"token_id": "abc"}));
        assert_eq!(by_token_id.token_id().as_deref(), Some("abc"));

        let ticker = TokenInfo::from_value(serde_json::json!({"ticker": "MC"}));
        assert_eq!(ticker.symbol(), Some("MC"));

        let none = TokenInfo::from_value(serde_json::json!({}));
        assert_eq!(none.token_id(), None);
    }
}
