//! Capability traits for the three external systems the workflow talks to,
//! plus their concrete implementations. The orchestration layer only sees
//! the traits.

pub mod git;
pub mod jira;
pub mod slack;

use crate::deploy::{DeploymentRecord, DeploymentResponse};
use crate::error::Result;
use crate::extract::extract_ticket_ids;
use crate::message::ChatMessage;
use crate::ticket::TicketInfo;
use regex::Regex;

pub trait VersionControlSystem {
    fn name(&self) -> &'static str;

    /// Changelog text for a commit range. Fails fatally if the range is
    /// unreadable.
    fn changelog(&self, commit_range: &str) -> Result<String>;

    /// Unique ticket ids in the range's changelog, first-seen order.
    fn ticket_ids_from_commit_range(
        &self,
        commit_range: &str,
        pattern: &Regex,
    ) -> Result<Vec<String>> {
        let changelog = self.changelog(commit_range)?;
        Ok(extract_ticket_ids(&changelog, pattern))
    }
}

pub trait TicketSystem {
    fn name(&self) -> &'static str;

    /// Pattern matching this tracker's ticket ids in commit text.
    fn ticket_id_pattern(&self) -> &Regex;

    fn ticket_info(&self, id: &str) -> Result<TicketInfo>;

    fn deployment_status(&self, id: &str) -> Result<String>;

    /// Sets the deployment-status field; `None` clears it.
    fn set_deployment_status(&self, id: &str, status: Option<&str>) -> Result<()>;

    /// Client-credentials grant against the tracker's token endpoint.
    fn exchange_credentials(&self, client_id: &str, client_secret: &str) -> Result<String>;

    /// Submits all records as one batch. Transport-level failures are `Err`;
    /// rejected records come back inside the response.
    fn submit_deployments(
        &self,
        records: &[DeploymentRecord],
        token: &str,
    ) -> Result<DeploymentResponse>;
}

/// Server acknowledgement of a sent chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub id: String,
}

pub trait ChatSystem {
    fn name(&self) -> &'static str;

    fn send(&self, message: &ChatMessage) -> Result<SentMessage>;
}
