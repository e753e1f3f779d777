//! Handler for the `agentlaunch.list_agents` tool.

use std::pin::Pin;
use std::sync::Arc;

use rmcp::model::{CallToolResult, JsonObject};
use serde_json::json;

use crate::toolkit::Toolkit;
use crate::tools::{ToolContext, ToolHandler, error_result, success_result};

/// Handler for the `agentlaunch.list_agents` tool.
pub struct ListAgentsHandler {
    toolkit: Arc<Toolkit>,
}

impl ListAgentsHandler {
    /// Create a new list agents handler.
    pub fn new(toolkit: Arc<Toolkit>) -> Self {
        Self { toolkit }
    }

    fn input_schema(&self) -> JsonObject {
        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), json!({}));
        schema
    }
}

impl ToolHandler for ListAgentsHandler {
    fn name(&self) -> &str {
        "agentlaunch.list_agents"
    }

    fn title(&self) -> Option<&str> {
        Some("AgentLaunch: List Agents")
    }

    fn description(&self) -> &str {
        "List all agents hosted under the configured Agentverse credential."
    }

    fn input_schema(&self) -> JsonObject {
        self.input_schema()
    }

    fn execute(
        &self,
        _args: JsonObject,
        _ctx: &ToolContext,
    ) -> Pin<Box<dyn std::future::Future<Output = anyhow::Result<CallToolResult>> + Send + '_>>
    {
        let toolkit = self.toolkit.clone();

        Box::pin(async move {
            match toolkit.list_agents().await {
                Ok(agents) => {
                    let agents_json = serde_json::to_value(&agents).unwrap_or(json!([]));
                    Ok(success_result(json!({
                        "status": "ok",
                        "count": agents.len(),
                        "agents": agents_json,
                    })))
                }
                Err(e) => Ok(error_result(format!("Failed to list agents: {}", e))),
            }
        })
    }
}
