//! Tool handler registry for managing MCP tool implementations.
//!
//! This module provides a simple way to register and invoke tool handlers,
//! making it easy to add new tools without modifying the core `ServerHandler`
//! implementation.

mod registry;

pub use registry::{ToolContext, ToolHandler, ToolRegistry};

// Tool handler implementations
mod agent_status;
mod deploy_agent;
mod launch_token;
mod list_agents;

pub use agent_status::AgentStatusHandler;
pub use deploy_agent::DeployAgentHandler;
pub use launch_token::LaunchTokenHandler;
pub use list_agents::ListAgentsHandler;

use rmcp::model::{CallToolResult, Content};
use serde_json::Value;

/// Wrap a JSON payload as a successful tool result.
pub(crate) fn success_result(payload: Value) -> CallToolResult {
    let text = serde_json::to_string(&payload)
        .unwrap_or_else(|_| "internal serialization error".to_string());
    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: None,
        is_error: Some(false),
        meta: None,
    }
}

/// Wrap an error reason as a failed tool result.
pub(crate) fn error_result(reason: impl Into<String>) -> CallToolResult {
    let payload = serde_json::json!({
        "status": "error",
        "reason": reason.into(),
    });
    let text = serde_json::to_string(&payload)
        .unwrap_or_else(|_| "internal serialization error".to_string());
    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: None,
        is_error: Some(true),
        meta: None,
    }
}
