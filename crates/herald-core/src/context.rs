use crate::error::{HeraldError, Result};
use std::collections::HashMap;

/// Merged per-run inputs: delivery flags, extra mentions and a snapshot of
/// the process environment (credential variables). Read-only for the run.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub send_message: bool,
    pub copy_message: bool,
    pub non_interactive: bool,
    pub mentions: Vec<String>,
    env: HashMap<String, String>,
}

impl RunContext {
    pub fn new(
        send_message: bool,
        copy_message: bool,
        non_interactive: bool,
        mentions: Vec<String>,
        env: HashMap<String, String>,
    ) -> Self {
        Self {
            send_message,
            copy_message,
            non_interactive,
            mentions,
            env,
        }
    }

    /// Context backed by the real process environment.
    pub fn from_process(
        send_message: bool,
        copy_message: bool,
        non_interactive: bool,
        mentions: Vec<String>,
    ) -> Self {
        Self::new(
            send_message,
            copy_message,
            non_interactive,
            mentions,
            std::env::vars().collect(),
        )
    }

    /// A non-empty environment variable, if set.
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn require_env(&self, key: &str) -> Result<&str> {
        self.env_var(key)
            .ok_or_else(|| HeraldError::MissingEnv(key.to_string()))
    }
}
