//! Deployment environment resolution.
//!
//! The config file declares environments and their aliases; both sides go
//! through the same normalization so "staging", "Staging" and "STAGING"
//! resolve to the same canonical name.

use crate::error::{HeraldError, Result};
use std::collections::{BTreeMap, HashMap};

/// Title-fold an environment name: word boundaries are non-alphanumeric
/// characters and lower→upper case transitions, each word is capitalized and
/// the rest lowercased. "my-env", "myEnv" and "MY_ENV" all become "MyEnv".
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut new_word = true;
    let mut prev_lower = false;

    for c in raw.chars() {
        if !c.is_alphanumeric() {
            new_word = true;
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            new_word = true;
        }
        if new_word {
            out.extend(c.to_uppercase());
            new_word = false;
        } else {
            out.extend(c.to_lowercase());
        }
        prev_lower = c.is_lowercase() || c.is_numeric();
    }

    out
}

/// True for the environment names that count as production when classifying
/// deployment records.
pub fn is_production(environment: &str) -> bool {
    matches!(
        environment.to_lowercase().as_str(),
        "live" | "prod" | "production"
    )
}

/// Alias→canonical lookup table, built once per run from the `server:`
/// section of the config file. Read-only after construction.
#[derive(Debug, Clone)]
pub struct EnvironmentTable {
    aliases: HashMap<String, String>,
    canonical: Vec<String>,
}

impl EnvironmentTable {
    pub fn from_server_table(server: &BTreeMap<String, Option<Vec<String>>>) -> Self {
        let mut aliases = HashMap::new();
        let mut canonical = Vec::new();

        for (environment, env_aliases) in server {
            let environment = normalize_name(environment);
            aliases.insert(environment.clone(), environment.clone());
            canonical.push(environment.clone());

            for alias in env_aliases.iter().flatten() {
                aliases.insert(normalize_name(alias), environment.clone());
            }
        }

        Self { aliases, canonical }
    }

    /// Canonical name for an environment or one of its aliases, in any casing.
    pub fn resolve(&self, name_or_alias: &str) -> Option<&str> {
        self.aliases
            .get(&normalize_name(name_or_alias))
            .map(String::as_str)
    }

    pub fn is_valid(&self, name_or_alias: &str) -> bool {
        self.resolve(name_or_alias).is_some()
    }

    /// Like [`resolve`](Self::resolve), but an unknown name is the terminal
    /// [`HeraldError::InvalidEnvironment`] carrying the full valid list.
    pub fn resolve_or_err(&self, name_or_alias: &str) -> Result<String> {
        self.resolve(name_or_alias)
            .map(str::to_string)
            .ok_or_else(|| HeraldError::InvalidEnvironment {
                given: name_or_alias.to_string(),
                known: self.canonical.clone(),
            })
    }

    /// All canonical environment names, in config order.
    pub fn all(&self) -> &[String] {
        &self.canonical
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
