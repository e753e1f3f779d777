//! Handler for the `agentlaunch.deploy_agent` tool.
//!
//! Deploy python agent source to the hosting platform: create, upload,
//! provision secrets, start, then wait for the agent to come up.

use std::pin::Pin;
use std::sync::Arc;

use rmcp::model::{CallToolResult, JsonObject};
use serde_json::json;

use crate::deploy::SecretEntry;
use crate::toolkit::Toolkit;
use crate::tools::{ToolContext, ToolHandler, error_result, success_result};

/// Handler for the `agentlaunch.deploy_agent` tool.
pub struct DeployAgentHandler {
    toolkit: Arc<Toolkit>,
}

impl DeployAgentHandler {
    /// Create a new deploy agent handler.
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
                "description": "Display name for the hosted agent (truncated to 64 characters)."
            }),
        );
        properties.insert(
            "code".to_string(),
            json!({
                "type": "string",
                "description": "Python agent source to upload as agent.py."
            }),
        );
        properties.insert(
            "secrets".to_string(),
            json!({
                "type": "object",
                "description": "Extra secrets to provision on the agent, as NAME: value pairs.",
                "additionalProperties": { "type": "string" }
            }),
        );
        properties.insert(
            "max_polls".to_string(),
            json!({
                "type": "integer",
                "description": "How many 5s status polls to attempt before giving up (default 12).",
                "minimum": 1
            }),
        );

        schema.insert("properties".to_string(), json!(properties));
        schema.insert("required".to_string(), json!(["name", "code"]));
        schema
    }
}

impl ToolHandler for DeployAgentHandler {
    fn name(&self) -> &str {
        "agentlaunch.deploy_agent"
    }

    fn title(&self) -> Option<&str> {
        Some("AgentLaunch: Deploy Agent")
    }

    fn description(&self) -> &str {
        "Deploy python agent source to Agentverse hosting and wait for it to start running."
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
                Some(s) if !s.trim().is_empty() => s.to_string(),
                _ => {
                    return Ok(error_result(
                        "agentlaunch.deploy_agent requires a non-empty `name` string",
                    ));
                }
            };

            let code = match args.get("code").and_then(|v| v.as_str()) {
                Some(s) if !s.trim().is_empty() => s.to_string(),
                _ => {
                    return Ok(error_result(
                        "agentlaunch.deploy_agent requires a non-empty `code` string",
                    ));
                }
            };

            let secrets: Vec<SecretEntry> = args
                .get("secrets")
                .and_then(|v| v.as_object())
                .map(|map| {
                    map.iter()
                        .filter_map(|(k, v)| v.as_str().map(|s| SecretEntry::new(k, s)))
                        .collect()
                })
                .unwrap_or_default();

            let max_polls = match parse_max_polls(&args) {
                Ok(value) => value,
                Err(reason) => return Ok(error_result(reason)),
            };

            match toolkit
                .deploy_agent(&name, &code, secrets, max_polls, None)
                .await
            {
                Ok(deployment) => {
                    let deployment_json = serde_json::to_value(&deployment)
                        .unwrap_or_else(|_| json!({ "address": deployment.address }));
                    Ok(success_result(json!({
                        "status": "ok",
                        "deployment": deployment_json,
                    })))
                }
                Err(e) => Ok(error_result(format!("Deployment failed: {}", e))),
            }
        })
    }
}

/// Parse the optional `max_polls` argument. Anything that is not a
/// positive integer fitting in u32 is rejected rather than truncated.
fn parse_max_polls(args: &JsonObject) -> Result<Option<u32>, String> {
    match args.get("max_polls") {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n >= 1)
            .map(Some)
            .ok_or_else(|| {
                format!(
                    "`max_polls` must be an integer between 1 and {}",
                    u32::MAX
                )
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_max_polls;
    use rmcp::model::JsonObject;
    use serde_json::json;

    fn args_with(value: serde_json::Value) -> JsonObject {
        let mut args = JsonObject::new();
        args.insert("max_polls".to_string(), value);
        args
    }

    #[test]
    fn max_polls_absent_means_default() {
        assert_eq!(parse_max_polls(&JsonObject::new()), Ok(None));
    }

    #[test]
    fn max_polls_accepts_values_in_range() {
        assert_eq!(parse_max_polls(&args_with(json!(1))), Ok(Some(1)));
        assert_eq!(
            parse_max_polls(&args_with(json!(u32::MAX))),
            Ok(Some(u32::MAX))
        );
    }

    #[test]
    fn max_polls_rejects_out_of_range_instead_of_truncating() {
        // u32::MAX + 2 would wrap to 1 under a plain cast.
        let wrapped = u64::from(u32::MAX) + 2;
        assert!(parse_max_polls(&args_with(json!(wrapped))).is_err());
        assert!(parse_max_polls(&args_with(json!(0))).is_err());
        assert!(parse_max_polls(&args_with(json!(-3))).is_err());
        assert!(parse_max_polls(&args_with(json!("12"))).is_err());
    }
}
