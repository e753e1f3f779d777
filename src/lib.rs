// Core modules
pub mod config;
pub mod deploy;
pub mod hosting;
pub mod http;
pub mod launchpad;
pub mod toolkit;

// MCP surface
mod tools;
pub mod server;

// Re-export key types and functions
pub use config::ApiConfig;
pub use deploy::{DeployError, DeployRequest, Deployer, Deployment, SecretEntry};
pub use hosting::{AgentInfo, HostingApi, HostingClient};
pub use http::HttpError;
pub use launchpad::{LaunchpadClient, TokenInfo, TokenRequest, handoff_url};
pub use server::McpServer;
pub use toolkit::Toolkit;
pub use tools::{ToolHandler, ToolRegistry};

use std::sync::Arc;

use anyhow::Result;
use tools::{AgentStatusHandler, DeployAgentHandler, LaunchTokenHandler, ListAgentsHandler};

/// Convenience function to create a fully configured MCP server.
///
/// This creates the Toolkit, registers the default tools, and returns
/// a McpServer that implements rmcp's ServerHandler.
pub fn create_server(config: ApiConfig) -> Result<Arc<McpServer>> {
    let toolkit = Arc::new(Toolkit::new(config)?);

    let tool_registry = ToolRegistry::new()
        .register_handler(DeployAgentHandler::new(toolkit.clone()))
        .register_handler(LaunchTokenHandler::new(toolkit.clone()))
        .register_handler(ListAgentsHandler::new(toolkit.clone()))
        .register_handler(AgentStatusHandler::new(toolkit.clone()));

    let tool_registry = Arc::new(tool_registry);

    let server = McpServer::new(toolkit, tool_registry);

    Ok(Arc::new(server))
}
