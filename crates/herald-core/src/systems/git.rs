use super::VersionControlSystem;
use crate::error::{HeraldError, Result};
use std::process::Command;

/// Reads changelogs via the system `git` binary.
#[derive(Debug, Default)]
pub struct GitVersionControlSystem;

impl GitVersionControlSystem {
    pub fn new() -> Self {
        Self
    }
}

impl VersionControlSystem for GitVersionControlSystem {
    fn name(&self) -> &'static str {
        "git"
    }

    fn changelog(&self, commit_range: &str) -> Result<String> {
        let output = Command::new("git")
            .args(["log", commit_range])
            .output()
            .map_err(|e| HeraldError::Changelog {
                range: commit_range.to_string(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(HeraldError::Changelog {
                range: commit_range.to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
