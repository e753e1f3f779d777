//! Deployment orchestrator: brings a source payload from nonexistent to
//! running on the hosting platform.
//!
//! Five ordered steps: create, upload, provision secrets, start, poll.
//! Create, upload, and start are all-or-nothing; a failure there aborts
//! the whole flow with the underlying HTTP error unchanged. Secret
//! provisioning never aborts — failures are accumulated into the result.
//! Polling is bounded; exhausting the budget is a normal outcome whose
//! status reflects the last known remote state, not an error.
//!
//! There is no cancellation hook: once a step's call or a poll sleep is
//! in flight it runs to completion. That reproduces the platform
//! contract this client was written against.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::hosting::{HostingApi, MAX_AGENT_NAME_LEN, truncate_chars};
use crate::http::{HttpError, Sleeper, TokioSleeper};

/// Default number of status polls before giving up.
pub const DEFAULT_MAX_POLLS: u32 = 12;

/// Default pause between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Secret name under which the credential is provisioned, so the hosted
/// agent can authenticate back to the platform.
pub const CREDENTIAL_SECRET_NAME: &str = "AGENTVERSE_API_KEY";

/// A named secret provisioned onto the hosted agent.
#[derive(Debug, Clone)]
pub struct SecretEntry {
    pub name: String,
    pub value: String,
}

impl SecretEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Everything the orchestrator needs. Immutable once `deploy` starts.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    /// Credential for the hosting API; also provisioned as the agent's
    /// `AGENTVERSE_API_KEY` secret.
    pub api_key: String,
    /// Display name; char-truncated to the platform cap before create.
    pub name: String,
    /// Agent source payload.
    pub source: String,
    /// Caller-supplied secrets, applied after the credential, in order.
    pub secrets: Vec<SecretEntry>,
    pub max_polls: u32,
    pub poll_interval: Duration,
}

impl DeployRequest {
    pub fn new(
        api_key: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            name: name.into(),
            source: source.into(),
            secrets: Vec::new(),
            max_polls: DEFAULT_MAX_POLLS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_secrets(mut self, secrets: Vec<SecretEntry>) -> Self {
        self.secrets = secrets;
        self
    }
}

/// Lifecycle status of a deployment, as last reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Started but the platform has not yet reported a finished build.
    Starting,
    /// Build finished, process not yet running.
    Compiled,
    /// Built and running. Terminal success.
    Running,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Starting => write!(f, "starting"),
            AgentStatus::Compiled => write!(f, "compiled"),
            AgentStatus::Running => write!(f, "running"),
        }
    }
}

/// Final orchestration result. The address never changes once assigned;
/// `secret_errors` only ever grows during provisioning.
#[derive(Debug, Clone, Serialize)]
pub struct Deployment {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    pub status: AgentStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secret_errors: Vec<String>,
}

/// Fatal orchestration failures (steps 1, 2 and 4 only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    /// The underlying HTTP failure, surfaced unchanged so callers can
    /// distinguish 401 from 409 from 5xx.
    Http(HttpError),
    /// A 2xx create response without an agent address. The remote
    /// contract was violated; the HTTP layer alone cannot detect this.
    MissingAddress,
}

impl DeployError {
    pub fn status(&self) -> u16 {
        match self {
            DeployError::Http(e) => e.status(),
            DeployError::MissingAddress => 0,
        }
    }
}

impl fmt::Display for DeployError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::Http(e) => write!(f, "{}", e),
            DeployError::MissingAddress => {
                write!(f, "create succeeded but returned no agent address")
            }
        }
    }
}

impl std::error::Error for DeployError {}

impl From<HttpError> for DeployError {
    fn from(e: HttpError) -> Self {
        DeployError::Http(e)
    }
}

/// Drives one hosting backend through the deployment flow.
pub struct Deployer<H: HostingApi> {
    hosting: H,
    sleeper: Arc<dyn Sleeper>,
}

impl<H: HostingApi> Deployer<H> {
    pub fn new(hosting: H) -> Self {
        Self::with_sleeper(hosting, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(hosting: H, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { hosting, sleeper }
    }

    /// Run the full flow. Steps execute strictly in sequence; secrets
    /// are applied one at a time in the order supplied, credential
    /// first, since the platform expects ordered secret writes.
    pub async fn deploy(&self, request: &DeployRequest) -> Result<Deployment, DeployError> {
        // Step 1: create. Must return an address.
        let name = truncate_chars(request.name.trim(), MAX_AGENT_NAME_LEN);
        tracing::info!("creating agent '{}'", name);
        let created = self.hosting.create_agent(&name).await?;
        let address = created.address.ok_or(DeployError::MissingAddress)?;
        tracing::info!("created agent {}", address);

        // Step 2: upload source. Nothing to start if this fails.
        self.hosting.upload_code(&address, &request.source).await?;
        tracing::info!("uploaded code to {}", address);

        // Step 3: provision secrets. Each entry is independent; a
        // failure is recorded and the rest are still attempted.
        let credential = SecretEntry::new(CREDENTIAL_SECRET_NAME, request.api_key.clone());
        let mut secret_errors = Vec::new();
        for entry in std::iter::once(&credential).chain(request.secrets.iter()) {
            match self
                .hosting
                .set_secret(&address, &entry.name, &entry.value)
                .await
            {
                Ok(()) => tracing::debug!("set secret {}", entry.name),
                Err(e) => {
                    tracing::warn!("failed to set secret {}: {}", entry.name, e);
                    secret_errors.push(format!("{}: {}", entry.name, e));
                }
            }
        }

        // Step 4: start. Nothing to poll for if this fails.
        self.hosting.start_agent(&address).await?;
        tracing::info!("started agent {}", address);

        // Step 5: poll until compiled and running, or the budget runs
        // out. Poll failures are transient; exhaustion is not an error.
        let mut status = AgentStatus::Starting;
        let mut wallet_address = None;
        for attempt in 1..=request.max_polls {
            self.sleeper.sleep(request.poll_interval).await;
            match self.hosting.get_agent(&address).await {
                Ok(info) => {
                    if info.wallet_address.is_some() {
                        wallet_address = info.wallet_address;
                    }
                    if info.compiled && info.running {
                        status = AgentStatus::Running;
                        tracing::info!("agent {} compiled and running", address);
                        break;
                    }
                    if info.compiled {
                        status = AgentStatus::Compiled;
                    }
                    tracing::debug!(
                        "agent {} not ready after poll {}/{} (status {})",
                        address,
                        attempt,
                        request.max_polls,
                        status
                    );
                }
                Err(e) => {
                    tracing::debug!("status poll {}/{} failed: {}", attempt, request.max_polls, e);
                }
            }
        }

        if status != AgentStatus::Running {
            tracing::warn!(
                "agent {} did not reach running within {} polls (last status {})",
                address,
                request.max_polls,
                status
            );
        }

        Ok(Deployment {
            address,
            wallet_address,
            status,
            secret_errors,
        })
    }
}
