//! Shared toolkit state used by both the CLI and the MCP tool handlers.
//!
//! Holds the resolved configuration and one client per remote API. The
//! toolkit itself keeps no mutable state; every orchestration call owns
//! its own deployment record, so concurrent calls against different
//! agent names do not interfere.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::deploy::{DeployError, DeployRequest, Deployer, Deployment, SecretEntry};
use crate::hosting::{AgentInfo, HostingApi, HostingClient};
use crate::http::HttpError;
use crate::launchpad::{LaunchpadClient, TokenInfo, TokenRequest, handoff_url};

/// Entry point for every operation the toolkit exposes.
pub struct Toolkit {
    config: ApiConfig,
    hosting: Arc<HostingClient>,
    launchpad: LaunchpadClient,
}

impl Toolkit {
    /// Build clients from a validated configuration.
    pub fn new(config: ApiConfig) -> Result<Self> {
        config.validate()?;

        let hosting = Arc::new(HostingClient::new(
            &config.agentverse_url,
            config.agentverse_key.clone(),
        ));
        let launchpad =
            LaunchpadClient::new(&config.launchpad_url, config.launchpad_key.clone());

        Ok(Self {
            config,
            hosting,
            launchpad,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn hosting(&self) -> &HostingClient {
        &self.hosting
    }

    pub fn launchpad(&self) -> &LaunchpadClient {
        &self.launchpad
    }

    /// Deploy agent source to the hosting platform and wait for it to
    /// come up. `max_polls`/`poll_interval` fall back to the platform
    /// defaults when not given.
    pub async fn deploy_agent(
        &self,
        name: &str,
        source: &str,
        secrets: Vec<SecretEntry>,
        max_polls: Option<u32>,
        poll_interval: Option<Duration>,
    ) -> Result<Deployment, DeployError> {
        let api_key = self.hosting.credential().ok_or_else(|| {
            DeployError::Http(HttpError::Config(
                "missing API credential (set AGENTVERSE_API_KEY or pass an explicit key)"
                    .to_string(),
            ))
        })?;

        let mut request = DeployRequest::new(api_key, name, source).with_secrets(secrets);
        if let Some(max_polls) = max_polls {
            request.max_polls = max_polls;
        }
        if let Some(poll_interval) = poll_interval {
            request.poll_interval = poll_interval;
        }

        Deployer::new(self.hosting.clone()).deploy(&request).await
    }

    /// Create a token and return it with its handoff link.
    pub async fn launch_token(
        &self,
        request: &TokenRequest,
    ) -> Result<(TokenInfo, Option<String>), HttpError> {
        let token = self.launchpad.create_token(request).await?;
        let handoff = token
            .token_id()
            .map(|id| handoff_url(&self.config.frontend_url, &id));
        Ok((token, handoff))
    }

    /// Tokenize an already-hosted agent.
    pub async fn tokenize_agent(
        &self,
        agent_address: &str,
        chain_id: u64,
    ) -> Result<(TokenInfo, Option<String>), HttpError> {
        let token = self.launchpad.tokenize_agent(agent_address, chain_id).await?;
        let handoff = token
            .token_id()
            .map(|id| handoff_url(&self.config.frontend_url, &id));
        Ok((token, handoff))
    }

    /// List hosted agents for the configured credential.
    pub async fn list_agents(&self) -> Result<Vec<AgentInfo>, HttpError> {
        self.hosting.list_agents().await
    }

    /// One status snapshot for a hosted agent.
    pub async fn agent_status(&self, address: &str) -> Result<AgentInfo, HttpError> {
        self.hosting.get_agent(address).await
    }
}
