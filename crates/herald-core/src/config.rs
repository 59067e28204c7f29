//! `.deploy-herald.yaml` — the per-project configuration file.
//!
//! Loaded once at startup and passed by reference into each component; there
//! is no process-wide configuration state.

use crate::context::RunContext;
use crate::environment::{normalize_name, EnvironmentTable};
use crate::error::{HeraldError, Result};
use crate::systems::git::GitVersionControlSystem;
use crate::systems::jira::{self, JiraTicketSystem};
use crate::systems::slack::{self, SlackChatSystem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const CONFIG_FILE: &str = ".deploy-herald.yaml";

// ---------------------------------------------------------------------------
// Per-system sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JiraConfig {
    #[serde(default)]
    pub domain: Option<String>,
    /// Display name of the deployment-status field, e.g. "Deployed in".
    #[serde(default)]
    pub field: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub channel: Option<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project name, used in the deployment summary line.
    pub name: String,
    #[serde(rename = "ticket-system", default = "default_ticket_system")]
    pub ticket_system: String,
    #[serde(rename = "chat-system", default = "default_chat_system")]
    pub chat_system: String,
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    /// Chat handles mentioned in the head message, e.g. "@here".
    #[serde(default)]
    pub mentions: Vec<String>,
    /// Environment name → aliases.
    #[serde(default)]
    pub server: BTreeMap<String, Option<Vec<String>>>,
    /// Environment name → deployed target URLs.
    #[serde(default)]
    pub urls: BTreeMap<String, Vec<String>>,
}

fn default_ticket_system() -> String {
    "jira".to_string()
}

fn default_chat_system() -> String {
    "slack".to_string()
}

impl Config {
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.is_file() {
            return Err(HeraldError::ConfigNotFound(CONFIG_FILE.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&data)?)
    }

    pub fn environment_table(&self) -> EnvironmentTable {
        EnvironmentTable::from_server_table(&self.server)
    }

    /// Target URLs for a canonical environment name. The `urls:` keys go
    /// through the same normalization as the environment table.
    pub fn urls_for(&self, environment: &str) -> Vec<String> {
        let wanted = normalize_name(environment);
        self.urls
            .iter()
            .find(|(key, _)| normalize_name(key) == wanted)
            .map(|(_, urls)| urls.clone())
            .unwrap_or_default()
    }

    /// Configured mentions plus the per-run additions, in that order.
    pub fn mentions_with(&self, extra: &[String]) -> Vec<String> {
        let mut mentions = self.mentions.clone();
        mentions.extend(extra.iter().cloned());
        mentions
    }

    // -----------------------------------------------------------------------
    // System factories
    // -----------------------------------------------------------------------

    /// Connects the configured ticket system. Credential environment
    /// variables are checked before any network call is made.
    pub fn ticket_system(&self, ctx: &RunContext) -> Result<JiraTicketSystem> {
        if self.ticket_system != "jira" {
            return Err(HeraldError::UnsupportedSystem {
                kind: "ticket-system",
                name: self.ticket_system.clone(),
            });
        }

        let domain = require_key(self.jira.domain.as_deref(), "jira.domain")?;
        let field = require_key(self.jira.field.as_deref(), "jira.field")?;
        let user = ctx.require_env("JIRA_USER_EMAIL")?;
        let token = ctx.require_env("JIRA_ACCESS_TOKEN")?;
        let cloud_id = ctx.env_var("JIRA_CLOUD_ID").map(str::to_string);

        JiraTicketSystem::connect(
            &format!("https://{domain}"),
            jira::DEFAULT_API_BASE,
            field,
            user,
            token,
            cloud_id,
        )
    }

    pub fn chat_system(&self, ctx: &RunContext) -> Result<SlackChatSystem> {
        if self.chat_system != "slack" {
            return Err(HeraldError::UnsupportedSystem {
                kind: "chat-system",
                name: self.chat_system.clone(),
            });
        }

        let channel = require_key(self.slack.channel.as_deref(), "slack.channel")?;
        let token = ctx.require_env("SLACK_ACCESS_TOKEN")?;

        SlackChatSystem::new(slack::DEFAULT_API_BASE, token, channel)
    }

    pub fn version_control(&self) -> GitVersionControlSystem {
        GitVersionControlSystem::new()
    }
}

fn require_key<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HeraldError::MissingConfig(key.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const SAMPLE: &str = r##"
name: my-project
jira:
  domain: example.atlassian.net
  field: "Deployed in"
slack:
  channel: "#deployments"
mentions:
  - "@here"
server:
  production:
    - live
    - prod
  staging:
urls:
  production:
    - https://example.com
  staging:
    - https://staging.example.com
    - https://preview.example.com
"##;

    fn sample() -> Config {
        serde_yaml::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn parses_full_config() {
        let cfg = sample();
        assert_eq!(cfg.name, "my-project");
        assert_eq!(cfg.ticket_system, "jira");
        assert_eq!(cfg.chat_system, "slack");
        assert_eq!(cfg.jira.domain.as_deref(), Some("example.atlassian.net"));
        assert_eq!(cfg.slack.channel.as_deref(), Some("#deployments"));
        assert_eq!(cfg.mentions, vec!["@here".to_string()]);
    }

    #[test]
    fn missing_name_is_an_error() {
        let err = serde_yaml::from_str::<Config>("server:\n  staging:\n").unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn environment_table_covers_aliases() {
        let cfg = sample();
        let table = cfg.environment_table();
        assert_eq!(table.resolve("LIVE"), Some("Production"));
        assert_eq!(table.resolve("staging"), Some("Staging"));
    }

    #[test]
    fn urls_lookup_goes_through_normalization() {
        let cfg = sample();
        assert_eq!(cfg.urls_for("Production"), vec!["https://example.com"]);
        assert_eq!(cfg.urls_for("Staging").len(), 2);
        assert!(cfg.urls_for("Qa").is_empty());
    }

    #[test]
    fn mentions_with_appends_extras() {
        let cfg = sample();
        let all = cfg.mentions_with(&["@ops".to_string()]);
        assert_eq!(all, vec!["@here".to_string(), "@ops".to_string()]);
    }

    #[test]
    fn load_fails_without_config_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(HeraldError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn load_reads_config_from_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), SAMPLE).unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.name, "my-project");
    }

    #[test]
    fn ticket_system_checks_env_before_any_network_call() {
        let cfg = sample();
        let ctx = RunContext::new(false, false, true, Vec::new(), HashMap::new());
        assert!(matches!(
            cfg.ticket_system(&ctx),
            Err(HeraldError::MissingEnv(k)) if k == "JIRA_USER_EMAIL"
        ));
    }

    #[test]
    fn ticket_system_requires_domain_and_field() {
        let mut cfg = sample();
        cfg.jira.domain = None;
        let ctx = RunContext::new(false, false, true, Vec::new(), HashMap::new());
        assert!(matches!(
            cfg.ticket_system(&ctx),
            Err(HeraldError::MissingConfig(k)) if k == "jira.domain"
        ));
    }

    #[test]
    fn chat_system_requires_channel_and_token() {
        let mut cfg = sample();
        let ctx = RunContext::new(false, false, true, Vec::new(), HashMap::new());
        assert!(matches!(
            cfg.chat_system(&ctx),
            Err(HeraldError::MissingEnv(k)) if k == "SLACK_ACCESS_TOKEN"
        ));

        cfg.slack.channel = None;
        assert!(matches!(
            cfg.chat_system(&ctx),
            Err(HeraldError::MissingConfig(k)) if k == "slack.channel"
        ));
    }

    #[test]
    fn unsupported_systems_are_rejected() {
        let mut cfg = sample();
        cfg.ticket_system = "linear".to_string();
        let ctx = RunContext::new(false, false, true, Vec::new(), HashMap::new());
        assert!(matches!(
            cfg.ticket_system(&ctx),
            Err(HeraldError::UnsupportedSystem { kind: "ticket-system", .. })
        ));
    }
}
