//! Deployment records for the ticket system's release-tracking API.
//!
//! One record per deployed target URL; all records of a run share the same
//! ticket-id list and commit-range description. The whole step is non-fatal:
//! the runner reports a `Failure` as warnings and completes the run.

use crate::context::RunContext;
use crate::environment::is_production;
use crate::error::Result;
use crate::systems::TicketSystem;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub deployment_sequence_number: u64,
    pub update_sequence_number: u64,
    pub issue_keys: Vec<String>,
    pub display_name: String,
    pub description: String,
    pub last_updated: String,
    pub label: String,
    pub state: String,
    pub url: String,
    pub pipeline: PipelineRef,
    pub environment: EnvironmentRef,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRef {
    pub id: String,
    pub display_name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentRef {
    pub id: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub environment_type: String,
}

/// Coarse classification for the record's environment-type field.
pub fn environment_type(environment: &str) -> &'static str {
    if is_production(environment) {
        "production"
    } else {
        "staging"
    }
}

/// One record per URL. Sequence numbers are 1-based in URL order; pipeline
/// and environment ids are derived from the run id so concurrent runs cannot
/// collide.
pub fn build_records(
    issue_keys: &[String],
    environment: &str,
    urls: &[String],
    commit_range: &str,
    run_id: &str,
    timestamp: &str,
) -> Vec<DeploymentRecord> {
    urls.iter()
        .enumerate()
        .map(|(index, url)| {
            let sequence = (index + 1) as u64;
            let pipeline_id = format!("deployment-{run_id}-{sequence}");
            DeploymentRecord {
                deployment_sequence_number: sequence,
                update_sequence_number: sequence,
                issue_keys: issue_keys.to_vec(),
                display_name: format!("Deployment of {commit_range}"),
                description: format!("Deployment of commit range '{commit_range}', generated by herald"),
                last_updated: timestamp.to_string(),
                label: pipeline_id.clone(),
                state: "successful".to_string(),
                url: url.clone(),
                pipeline: PipelineRef {
                    id: pipeline_id,
                    display_name: environment.to_string(),
                    url: url.clone(),
                },
                environment: EnvironmentRef {
                    id: format!("environment-{run_id}-{sequence}"),
                    display_name: environment.to_string(),
                    environment_type: environment_type(environment).to_string(),
                },
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Parsed outcome of a batch submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResponse {
    pub status: u16,
    pub rejections: Vec<String>,
}

impl DeploymentResponse {
    /// Accepted means a 2xx status and zero rejected records.
    pub fn is_accepted(&self) -> bool {
        (200..300).contains(&self.status) && self.rejections.is_empty()
    }

    pub fn is_auth_expired(&self) -> bool {
        self.status == 401
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishResult {
    Success,
    Failure(Vec<String>),
}

// ---------------------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------------------

/// Builds and submits the deployment records for a run.
///
/// Preconditions fail fast without any remote call. A 401 on submission
/// triggers exactly one fresh token and one resubmission; the second failure
/// is surfaced as-is.
pub fn publish(
    tickets: &dyn TicketSystem,
    ctx: &RunContext,
    environment: &str,
    issue_keys: &[String],
    urls: &[String],
    commit_range: &str,
) -> PublishResult {
    if issue_keys.is_empty() {
        return PublishResult::Failure(vec!["No Jira Issues have been provided.".to_string()]);
    }
    if urls.is_empty() {
        return PublishResult::Failure(vec!["No URLs have been provided.".to_string()]);
    }

    let token = match ctx.env_var("JIRA_JWT") {
        Some(token) => token.to_string(),
        None => match fresh_token(tickets, ctx) {
            Ok(token) => token,
            Err(error) => return PublishResult::Failure(vec![error.to_string()]),
        },
    };

    let run_id = uuid::Uuid::new_v4().simple().to_string();
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let records = build_records(issue_keys, environment, urls, commit_range, &run_id, &timestamp);

    let mut response = match tickets.submit_deployments(&records, &token) {
        Ok(response) => response,
        Err(error) => return PublishResult::Failure(vec![error.to_string()]),
    };

    if response.is_auth_expired() {
        let token = match fresh_token(tickets, ctx) {
            Ok(token) => token,
            Err(error) => return PublishResult::Failure(vec![error.to_string()]),
        };
        response = match tickets.submit_deployments(&records, &token) {
            Ok(response) => response,
            Err(error) => return PublishResult::Failure(vec![error.to_string()]),
        };
    }

    if response.is_accepted() {
        PublishResult::Success
    } else if !response.rejections.is_empty() {
        PublishResult::Failure(response.rejections)
    } else {
        PublishResult::Failure(vec![format!(
            "deployment submission was not accepted (status {})",
            response.status
        )])
    }
}

fn fresh_token(tickets: &dyn TicketSystem, ctx: &RunContext) -> Result<String> {
    let client_id = ctx.require_env("JIRA_CLIENT_ID")?;
    let client_secret = ctx.require_env("JIRA_CLIENT_SECRET")?;
    tickets.exchange_credentials(client_id, client_secret)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
