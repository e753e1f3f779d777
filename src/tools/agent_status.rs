//! Handler for the `agentlaunch.agent_status` tool.

use std::pin::Pin;
use std::sync::Arc;

use rmcp::model::{CallToolResult, JsonObject};
use serde_json::json;

use crate::toolkit::Toolkit;
use crate::tools::{ToolContext, ToolHandler, error_result, success_result};

/// Handler for the `agentlaunch.agent_status` tool.
pub struct AgentStatusHandler {
    toolkit: Arc<Toolkit>,
}

impl AgentStatusHandler {
    /// Create a new agent status handler.
    pub fn new(toolkit: Arc<Toolkit>) -> Self {
        Self { toolkit }
    }

    fn input_schema(&self) -> JsonObject {
        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));

        let mut properties = serde_json::Map::new();
        properties.insert(
            "address".to_string(),
            json!({
                "type": "string",
                "description": "The hosted agent's address (e.g. 'agent1q...')."
            }),
        );

        schema.insert("properties".to_string(), json!(properties));
        schema.insert("required".to_string(), json!(["address"]));
        schema
    }
}

impl ToolHandler for AgentStatusHandler {
    fn name(&self) -> &str {
        "agentlaunch.agent_status"
    }

    fn title(&self) -> Option<&str> {
        Some("AgentLaunch: Agent Status")
    }

    fn description(&self) -> &str {
        "Fetch one status snapshot (compiled/running/wallet) for a hosted agent."
    }

    fn input_schema(&self) -> JsonObject {
        self.input_schema()
    }

    fn execute(
        &self,
        args: JsonObject,
        _ctx: &ToolContext,
    ) -> Pin<Box<dyn std::future::Future<Output = anyhow::Result<CallToolResult>> + Send + '_>>
    {
        let toolkit = self.toolkit.clone();

        Box::pin(async move {
            let address = match args.get("address").and_then(|v| v.as_str()) {
                Some(s) if !s.trim().is_empty() => s.to_string(),
                _ => {
                    return Ok(error_result(
                        "agentlaunch.agent_status requires a non-empty `address` string",
                    ));
                }
            };

            match toolkit.agent_status(&address).await {
                Ok(info) => {
                    let agent_json = serde_json::to_value(&info).unwrap_or(json!(null));
                    Ok(success_result(json!({
                        "status": "ok",
                        "agent": agent_json,
                    })))
                }
                Err(e) => Ok(error_result(format!("Status lookup failed: {}", e))),
            }
        })
    }
}
