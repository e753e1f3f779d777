//! Handler for the `agentlaunch.launch_token` tool.
//!
//! Create a token record on the launchpad backend and return it together
//! with the handoff link a human opens to deploy the token on-chain.

use std::pin::Pin;
use std::sync::Arc;

use rmcp::model::{CallToolResult, JsonObject};
use serde_json::json;

use crate::launchpad::{DEFAULT_CHAIN_ID, TokenRequest, derive_ticker};
use crate::toolkit::Toolkit;
use crate::tools::{ToolContext, ToolHandler, error_result, success_result};

/// Handler for the `agentlaunch.launch_token` tool.
pub struct LaunchTokenHandler {
    toolkit: Arc<Toolkit>,
}

impl LaunchTokenHandler {
    /// Create a new launch token handler.
    pub fn new(toolkit: Arc<Toolkit>) -> Self {
        Self { toolkit }
    }

    /// Build the input schema for this tool.
    fn input_schema(&self) -> JsonObject {
        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));

        let mut properties = serde_json::Map::new();
        properties.insert(
            "name".to_string(),
            json!({
                "type": "string",
                "description": "Token name (truncated to 32 characters)."
            }),
        );
        properties.insert(
            "ticker".to_string(),
            json!({
                "type": "string",
                "description": "Token symbol (truncated to 11 characters). Derived from the name when omitted."
            }),
        );
        properties.insert(
            "description".to_string(),
            json!({
                "type": "string",
                "description": "Token description shown on the launchpad."
            }),
        );
        properties.insert(
            "logo".to_string(),
            json!({
                "type": "string",
                "description": "Logo image URL."
            }),
        );
        properties.insert(
            "chain_id".to_string(),
            json!({
                "type": "integer",
                "description": "Target chain id (97 = BSC testnet, 56 = BSC mainnet). Defaults to 97."
            }),
        );

        schema.insert("properties".to_string(), json!(properties));
        schema.insert("required".to_string(), json!(["name"]));
        schema
    }
}

impl ToolHandler for LaunchTokenHandler {
    fn name(&self) -> &str {
        "agentlaunch.launch_token"
    }

    fn title(&self) -> Option<&str> {
        Some("AgentLaunch: Launch Token")
    }

    fn description(&self) -> &str {
        "Create a token on the launchpad backend and return the record plus the wallet handoff link."
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
            let name = match args.get("name").and_then(|v| v.as_str()) {
                Some(s) if !s.trim().is_empty() => s.trim().to_string(),
                _ => {
                    return Ok(error_result(
                        "agentlaunch.launch_token requires a non-empty `name` string",
                    ));
                }
            };

            let ticker = args
                .get("ticker")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| derive_ticker(&name));

            let mut request = TokenRequest::new(name, ticker);
            request.description = args
                .get("description")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            request.logo = args
                .get("logo")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            request.chain_id = args
                .get("chain_id")
                .and_then(|v| v.as_u64())
                .unwrap_or(DEFAULT_CHAIN_ID);

            match toolkit.launch_token(&request).await {
                Ok((token, handoff)) => Ok(success_result(json!({
                    "status": "ok",
                    "token": token.raw(),
                    "handoff_url": handoff,
                }))),
                Err(e) => Ok(error_result(format!("Token launch failed: {}", e))),
            }
        })
    }
}
