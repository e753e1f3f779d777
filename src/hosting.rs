//! Agentverse hosting API client.
//!
//! Thin typed wrappers over the remote hosting endpoints. The upload
//! endpoint's body is double-encoded: the `code` field carries a JSON
//! *string* containing the file-descriptor array, not a nested array.
//! That convention is dictated by the platform and reproduced exactly.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::http::{AuthScheme, CredentialMode, HttpClient, HttpError, normalize_items};

/// Maximum agent display-name length accepted by the platform.
pub const MAX_AGENT_NAME_LEN: usize = 64;

/// Remote-reported agent state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Assigned remote identifier. Optional so a malformed 2xx create
    /// response can be detected instead of silently defaulted.
    pub address: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub compiled: bool,
    #[serde(default)]
    pub wallet_address: Option<String>,
}

/// One source file in the upload descriptor array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeFile {
    pub language: String,
    pub name: String,
    pub value: String,
}

impl CodeFile {
    /// The single-file python layout every hosted agent uses.
    pub fn python_agent(source: &str) -> Self {
        Self {
            language: "python".to_string(),
            name: "agent.py".to_string(),
            value: source.to_string(),
        }
    }
}

/// Build the double-encoded upload body for a source payload.
pub fn encode_code_payload(source: &str) -> Result<Value, HttpError> {
    let files = vec![CodeFile::python_agent(source)];
    let encoded = serde_json::to_string(&files)
        .map_err(|e| HttpError::Config(format!("failed to encode code payload: {}", e)))?;
    Ok(json!({ "code": encoded }))
}

/// Truncate to a character count without splitting a UTF-8 scalar.
pub fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// The hosting operations the deployment orchestrator drives. A trait
/// so orchestration can be exercised against doubles.
#[async_trait]
pub trait HostingApi: Send + Sync {
    async fn create_agent(&self, name: &str) -> Result<AgentInfo, HttpError>;
    async fn upload_code(&self, address: &str, source: &str) -> Result<(), HttpError>;
    async fn set_secret(&self, address: &str, name: &str, secret: &str)
    -> Result<(), HttpError>;
    async fn start_agent(&self, address: &str) -> Result<(), HttpError>;
    async fn get_agent(&self, address: &str) -> Result<AgentInfo, HttpError>;
}

#[async_trait]
impl<T: HostingApi + ?Sized> HostingApi for std::sync::Arc<T> {
    async fn create_agent(&self, name: &str) -> Result<AgentInfo, HttpError> {
        (**self).create_agent(name).await
    }

    async fn upload_code(&self, address: &str, source: &str) -> Result<(), HttpError> {
        (**self).upload_code(address, source).await
    }

    async fn set_secret(
        &self,
        address: &str,
        name: &str,
        secret: &str,
    ) -> Result<(), HttpError> {
        (**self).set_secret(address, name, secret).await
    }

    async fn start_agent(&self, address: &str) -> Result<(), HttpError> {
        (**self).start_agent(address).await
    }

    async fn get_agent(&self, address: &str) -> Result<AgentInfo, HttpError> {
        (**self).get_agent(address).await
    }
}

/// Production client over the shared HTTP layer. All hosting calls
/// require the credential and use `Authorization: Bearer`.
pub struct HostingClient {
    http: HttpClient,
}

impl HostingClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http: HttpClient::new(base_url, AuthScheme::Bearer, api_key),
        }
    }

    /// Build over an existing HTTP client (tests inject doubles here).
    pub fn from_client(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn credential(&self) -> Option<&str> {
        self.http.credential()
    }

    /// List all hosted agents for this credential.
    pub async fn list_agents(&self) -> Result<Vec<AgentInfo>, HttpError> {
        let value = self
            .http
            .request(
                Method::GET,
                "/hosting/agents",
                &[],
                None,
                CredentialMode::Required,
            )
            .await?;

        normalize_items(value)
            .into_iter()
            .map(|item| {
                serde_json::from_value(item)
                    .map_err(|e| HttpError::Transport(format!("unexpected agent shape: {}", e)))
            })
            .collect()
    }
}

#[async_trait]
impl HostingApi for HostingClient {
    async fn create_agent(&self, name: &str) -> Result<AgentInfo, HttpError> {
        self.http
            .request_json(
                Method::POST,
                "/hosting/agents",
                &[],
                Some(&json!({ "name": name })),
                CredentialMode::Required,
            )
            .await
    }

    async fn upload_code(&self, address: &str, source: &str) -> Result<(), HttpError> {
        let body = encode_code_payload(source)?;
        self.http
            .request(
                Method::PUT,
                &format!("/hosting/agents/{}/code", address),
                &[],
                Some(&body),
                CredentialMode::Required,
            )
            .await?;
        Ok(())
    }

    async fn set_secret(
        &self,
        address: &str,
        name: &str,
        secret: &str,
    ) -> Result<(), HttpError> {
        self.http
            .request(
                Method::POST,
                "/hosting/secrets",
                &[],
                Some(&json!({
                    "address": address,
                    "name": name,
                    "secret": secret,
                })),
                CredentialMode::Required,
            )
            .await?;
        Ok(())
    }

    async fn start_agent(&self, address: &str) -> Result<(), HttpError> {
        self.http
            .request(
                Method::POST,
                &format!("/hosting/agents/{}/start", address),
                &[],
                Some(&json!({})),
                CredentialMode::Required,
            )
            .await?;
        Ok(())
    }

    async fn get_agent(&self, address: &str) -> Result<AgentInfo, HttpError> {
        self.http
            .request_json(
                Method::GET,
                &format!("/hosting/agents/{}", address),
                &[],
                None,
                CredentialMode::Required,
            )
            .await
    }
}
