//! Registry of MCP tool handlers.
//!
//! Each toolkit operation is exposed through one `ToolHandler`. The
//! registry owns the handlers, advertises them for `list_tools`, and
//! dispatches `call_tool` requests by name. Handlers only describe
//! themselves (name, description, input schema); the registry builds
//! the wire-level `Tool` records so no handler touches rmcp's model
//! beyond its own result payload.

use anyhow::Result;
use rmcp::RoleServer;
use rmcp::model::{CallToolResult, JsonObject, Tool as McpTool};
use rmcp::service::RequestContext;
use std::borrow::Cow;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Context passed to tool handlers during execution.
#[derive(Clone)]
pub struct ToolContext {
    /// Request context from rmcp (for session info, etc.)
    pub request_context: RequestContext<RoleServer>,
}

/// One toolkit operation exposed over MCP.
pub trait ToolHandler: Send + Sync {
    /// The tool's wire name (e.g. "agentlaunch.deploy_agent").
    fn name(&self) -> &str;

    /// Human-readable title, when the tool has one.
    fn title(&self) -> Option<&str> {
        None
    }

    fn description(&self) -> &str;

    /// JSON schema for the tool's arguments.
    fn input_schema(&self) -> JsonObject;

    /// Executes the tool with the given arguments.
    fn execute(
        &self,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<CallToolResult>> + Send + '_>>;
}

/// Owns the handlers and dispatches MCP tool requests to them.
#[derive(Clone)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under its own name. Builder-style so the
    /// full registry reads as one expression at wiring time.
    pub fn register_handler<T: ToolHandler + 'static>(mut self, handler: T) -> Self {
        self.handlers
            .insert(handler.name().to_string(), Arc::new(handler));
        self
    }

    /// Look up a handler by tool name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Advertise every registered tool, sorted by name so listings are
    /// stable across runs.
    pub fn list_tools(&self) -> Vec<McpTool> {
        let mut tools: Vec<McpTool> = self
            .handlers
            .values()
            .map(|handler| McpTool {
                name: Cow::Owned(handler.name().to_string()),
                title: handler.title().map(|s| s.to_string()),
                description: Some(Cow::Owned(handler.description().to_string())),
                input_schema: Arc::new(handler.input_schema()),
                output_schema: None,
                annotations: None,
                icons: None,
                meta: None,
            })
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Dispatch a tool call by name.
    pub async fn call_tool(
        &self,
        name: &str,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Result<CallToolResult> {
        let handler = self
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Tool not found: {}", name))?;
        handler.execute(args, ctx).await
    }
}
