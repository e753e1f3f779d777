//! MCP server implementation using rmcp.
//!
//! Exposes the toolkit's operations as MCP tools over stdio or
//! streamable HTTP.

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::*,
    service::{RequestContext, RoleServer},
};

use crate::toolkit::Toolkit;
use crate::tools::ToolRegistry;

/// MCP server that handles protocol requests and delegates to tool handlers.
#[derive(Clone)]
pub struct McpServer {
    toolkit: Arc<Toolkit>,
    tool_registry: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a new MCP server with the given toolkit and tool registry.
    pub fn new(toolkit: Arc<Toolkit>, tool_registry: Arc<ToolRegistry>) -> Self {
        Self {
            toolkit,
            tool_registry,
        }
    }

    /// Get the toolkit.
    pub fn toolkit(&self) -> &Arc<Toolkit> {
        &self.toolkit
    }

    /// Get the tool registry.
    pub fn tool_registry(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }
}

impl ServerHandler for McpServer {
    fn ping(
        &self,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<(), McpError>> + Send + '_ {
        std::future::ready(Ok(()))
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let result = ListToolsResult {
            tools: self.tool_registry.list_tools(),
            next_cursor: None,
            ..Default::default()
        };
        std::future::ready(Ok(result))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let tool_name = request.name.to_string();
        let args = request.arguments.unwrap_or_default();
        let registry = self.tool_registry.clone();

        async move {
            let ctx = crate::tools::ToolContext {
                request_context: context,
            };

            match registry.call_tool(&tool_name, args, &ctx).await {
                Ok(result) => Ok(result),
                Err(e) => Err(McpError::internal_error(
                    format!("Tool execution failed: {}", e),
                    None,
                )),
            }
        }
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "AgentLaunch toolkit: deploy python agents to Agentverse hosting and \
                 launch tokens for them on the AgentLaunch backend. Token deployment \
                 on-chain is handed off to the user's wallet via a link."
                    .to_string(),
            ),
        }
    }
}

/// Start the toolkit as an MCP Streamable HTTP server.
///
/// This exposes the MCP endpoint at `/mcp` on the given bind address,
/// e.g. `127.0.0.1:3952` or `0.0.0.0:3952`.
pub async fn start_mcp_http(server: Arc<McpServer>, bind: &str) -> Result<()> {
    let toolkit = server.toolkit().clone();
    let tool_registry = server.tool_registry().clone();

    let service = StreamableHttpService::new(
        move || Ok(McpServer::new(toolkit.clone(), tool_registry.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let router = Router::new().nest_service("/mcp", service);
    let listener = tokio::net::TcpListener::bind(bind).await?;

    tracing::info!("MCP HTTP server listening on http://{}", bind);

    axum::serve(listener, router).await?;

    Ok(())
}
