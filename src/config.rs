//! Configuration resolution for the toolkit.
//!
//! Credentials and base URLs can come from an explicit argument or from
//! one of several environment variable names (a primary name plus legacy
//! aliases kept for older deployments). Resolution is deterministic:
//! explicit argument wins, then candidate names in order. The lookup
//! function is injected so the chain can be tested without touching the
//! process environment.

use anyhow::Result;
use std::env;
use url::Url;

/// Default Agentverse hosting API base URL.
pub const DEFAULT_AGENTVERSE_URL: &str = "https://agentverse.ai/v1";

/// Default AgentLaunch backend base URL (dev environment).
pub const DEFAULT_LAUNCHPAD_URL: &str =
    "https://launchpad-backend-dev-1056182620041.us-central1.run.app";

/// Default AgentLaunch frontend base URL (dev environment).
pub const DEFAULT_FRONTEND_URL: &str =
    "https://launchpad-frontend-dev-1056182620041.us-central1.run.app";

/// Candidate env vars for the Agentverse credential, in precedence order.
pub const AGENTVERSE_KEY_VARS: &[&str] = &["AGENTVERSE_API_KEY", "AGENT_LAUNCH_API_KEY"];

/// Candidate env vars for the Agentverse base URL.
pub const AGENTVERSE_URL_VARS: &[&str] = &["AGENTVERSE_API_URL"];

/// Candidate env vars for the launchpad base URL. `AGENTLAUNCH_API` is a
/// legacy alias still set by older agent deployments.
pub const LAUNCHPAD_URL_VARS: &[&str] = &["AGENT_LAUNCH_API_URL", "AGENTLAUNCH_API"];

/// Candidate env vars for the frontend base URL.
pub const FRONTEND_URL_VARS: &[&str] = &["AGENT_LAUNCH_FRONTEND_URL"];

/// Resolve a configuration value from an explicit argument and an ordered
/// list of candidate names. The explicit argument always wins; otherwise
/// the first candidate for which `lookup` returns a non-empty value is
/// used.
pub fn resolve_value(
    explicit: Option<&str>,
    candidates: &[&str],
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    if let Some(value) = explicit {
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    for name in candidates {
        if let Some(value) = lookup(name) {
            if !value.is_empty() {
                return Some(value);
            }
        }
    }

    None
}

/// Resolve a value against the process environment.
pub fn resolve_env(explicit: Option<&str>, candidates: &[&str]) -> Option<String> {
    resolve_value(explicit, candidates, |name| env::var(name).ok())
}

/// Resolved endpoints and credentials for both remote APIs.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Agentverse hosting API base URL (no trailing slash).
    pub agentverse_url: String,
    /// Agentverse API key, sent as `Authorization: Bearer <key>`.
    pub agentverse_key: Option<String>,
    /// AgentLaunch backend base URL (no trailing slash).
    pub launchpad_url: String,
    /// AgentLaunch API key, sent as `X-API-Key`. The platforms share a
    /// credential today, so this falls back to the Agentverse key.
    pub launchpad_key: Option<String>,
    /// Frontend base URL used for handoff links.
    pub frontend_url: String,
}

impl ApiConfig {
    /// Build a config from the process environment. An explicit key
    /// takes precedence over every env var.
    pub fn from_env(api_key: Option<&str>) -> Self {
        let agentverse_key = resolve_env(api_key, AGENTVERSE_KEY_VARS);

        Self {
            agentverse_url: resolve_env(None, AGENTVERSE_URL_VARS)
                .unwrap_or_else(|| DEFAULT_AGENTVERSE_URL.to_string()),
            launchpad_key: agentverse_key.clone(),
            agentverse_key,
            launchpad_url: resolve_env(None, LAUNCHPAD_URL_VARS)
                .unwrap_or_else(|| DEFAULT_LAUNCHPAD_URL.to_string()),
            frontend_url: resolve_env(None, FRONTEND_URL_VARS)
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
        }
    }

    /// Validate that every configured base URL parses and uses http(s).
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("agentverse", &self.agentverse_url),
            ("launchpad", &self.launchpad_url),
            ("frontend", &self.frontend_url),
        ] {
            let parsed = Url::parse(value)
                .map_err(|e| anyhow::anyhow!("invalid {} base URL `{}`: {}", label, value, e))?;
            if !["http", "https"].contains(&parsed.scheme()) {
                return Err(anyhow::anyhow!(
                    "{} base URL must use http or https: {}",
                    label,
                    value
                ));
            }
        }
        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_env(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(map: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| map.get(name).map(|v| v.to_string())
    }

    #[test]
    fn explicit_argument_wins() {
        let mut vars = HashMap::new();
        vars.insert("AGENTVERSE_API_KEY", "from-primary");
        vars.insert("AGENT_LAUNCH_API_KEY", "from-alias");

        let resolved = resolve_value(Some("from-arg"), AGENTVERSE_KEY_VARS, lookup_from(&vars));
        assert_eq!(resolved.as_deref(), Some("from-arg"));
    }

    #[test]
    fn primary_name_beats_legacy_alias() {
        let mut vars = HashMap::new();
        vars.insert("AGENT_LAUNCH_API_URL", "https://primary.example");
        vars.insert("AGENTLAUNCH_API", "https://legacy.example");

        let resolved = resolve_value(None, LAUNCHPAD_URL_VARS, lookup_from(&vars));
        assert_eq!(resolved.as_deref(), Some("https://primary.example"));
    }

    #[test]
    fn legacy_alias_used_when_primary_absent() {
        let mut vars = HashMap::new();
        vars.insert("AGENTLAUNCH_API", "https://legacy.example");

        let resolved = resolve_value(None, LAUNCHPAD_URL_VARS, lookup_from(&vars));
        assert_eq!(resolved.as_deref(), Some("https://legacy.example"));
    }

    #[test]
    fn empty_values_are_skipped() {
        let mut vars = HashMap::new();
        vars.insert("AGENTVERSE_API_KEY", "");
        vars.insert("AGENT_LAUNCH_API_KEY", "from-alias");

        let resolved = resolve_value(None, AGENTVERSE_KEY_VARS, lookup_from(&vars));
        assert_eq!(resolved.as_deref(), Some("from-alias"));

        let none = resolve_value(Some(""), &["MISSING"], |_| None);
        assert_eq!(none, None);
    }

    #[test]
    fn validate_rejects_bad_scheme() {
        let config = ApiConfig {
            agentverse_url: "ftp://agentverse.ai/v1".to_string(),
            agentverse_key: None,
            launchpad_url: DEFAULT_LAUNCHPAD_URL.to_string(),
            launchpad_key: None,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        let config = ApiConfig {
            agentverse_url: DEFAULT_AGENTVERSE_URL.to_string(),
            agentverse_key: Some("key".to_string()),
            launchpad_url: DEFAULT_LAUNCHPAD_URL.to_string(),
            launchpad_key: Some("key".to_string()),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
        };
        assert!(config.validate().is_ok());
    }
}
