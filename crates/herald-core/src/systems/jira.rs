//! Jira ticket system: issue lookups, deployment-status field updates and
//! the release-tracking deployments API.

use super::TicketSystem;
use crate::deploy::{DeploymentRecord, DeploymentResponse};
use crate::error::{HeraldError, Result};
use crate::ticket::TicketInfo;
use regex::Regex;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.atlassian.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Jira sets this header when the account is locked behind a captcha; API
/// calls keep failing until the user logs in via the browser.
const SERAPH_LOGIN_HEADER: &str = "X-Seraph-LoginReason";

static TICKET_ID_RE: OnceLock<Regex> = OnceLock::new();

fn ticket_id_re() -> &'static Regex {
    TICKET_ID_RE.get_or_init(|| Regex::new(r"[A-Z]+-[0-9]+").unwrap())
}

pub struct JiraTicketSystem {
    client: Client,
    /// `https://<domain>`, serving the issue API and browse URLs.
    base_url: String,
    /// Atlassian cloud API, serving the token endpoint and deployments API.
    api_base: String,
    /// Resolved field key of the deployment-status field.
    field_key: String,
    user: String,
    token: String,
    /// Explicitly configured cloud id; resolved lazily from the tenant info
    /// endpoint when absent.
    cloud_id_hint: Option<String>,
    cloud_id: OnceLock<String>,
}

impl JiraTicketSystem {
    /// Connects to Jira and resolves `field_name` (a display name such as
    /// "Deployed in") to its field key. An unknown field is fatal: the
    /// config does not match the Jira installation.
    pub fn connect(
        base_url: &str,
        api_base: &str,
        field_name: &str,
        user: &str,
        token: &str,
        cloud_id_hint: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let mut system = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            field_key: String::new(),
            user: user.to_string(),
            token: token.to_string(),
            cloud_id_hint,
            cloud_id: OnceLock::new(),
        };
        system.field_key = system.resolve_field_key(field_name)?;
        Ok(system)
    }

    pub fn field_key(&self) -> &str {
        &self.field_key
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.user, Some(&self.token))
    }

    fn check_captcha(response: &Response) -> Result<()> {
        let denied = response
            .headers()
            .get(SERAPH_LOGIN_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("AUTHENTICATION_DENIED"));
        if denied {
            return Err(HeraldError::CaptchaRequired);
        }
        Ok(())
    }

    fn resolve_field_key(&self, field_name: &str) -> Result<String> {
        let response = self
            .request(Method::GET, format!("{}/rest/api/2/field", self.base_url))
            .send()?;
        Self::check_captcha(&response)?;
        let fields: Value = response.error_for_status()?.json()?;

        for field in fields.as_array().map(Vec::as_slice).unwrap_or_default() {
            let name = field.get("name").and_then(Value::as_str);
            let untranslated = field.get("untranslatedName").and_then(Value::as_str);
            if name == Some(field_name) || untranslated == Some(field_name) {
                if let Some(key) = field.get("key").and_then(Value::as_str) {
                    return Ok(key.to_string());
                }
            }
        }

        Err(HeraldError::UnknownJiraField(field_name.to_string()))
    }

    fn resolve_cloud_id(&self) -> Result<String> {
        if let Some(id) = &self.cloud_id_hint {
            return Ok(id.clone());
        }
        if let Some(id) = self.cloud_id.get() {
            return Ok(id.clone());
        }

        let url = format!("{}/_edge/tenant_info", self.base_url);
        let info: Value = self
            .request(Method::GET, url.clone())
            .send()?
            .error_for_status()?
            .json()?;
        let id = info
            .get("cloudId")
            .and_then(Value::as_str)
            .ok_or_else(|| HeraldError::TicketSystem(format!("no cloud id in response from {url}")))?;
        let _ = self.cloud_id.set(id.to_string());
        Ok(id.to_string())
    }
}

impl TicketSystem for JiraTicketSystem {
    fn name(&self) -> &'static str {
        "jira"
    }

    fn ticket_id_pattern(&self) -> &Regex {
        ticket_id_re()
    }

    fn ticket_info(&self, id: &str) -> Result<TicketInfo> {
        let url = format!("{}/rest/api/2/issue/{id}?fields=summary", self.base_url);
        let response = self.request(Method::GET, url).send()?;
        Self::check_captcha(&response)?;
        let data: Value = response.error_for_status()?.json()?;

        let title = data["fields"]["summary"]
            .as_str()
            .ok_or_else(|| HeraldError::TicketSystem(format!("issue {id} has no summary")))?;

        Ok(TicketInfo::new(
            id,
            title,
            format!("{}/browse/{id}", self.base_url),
        ))
    }

    fn deployment_status(&self, id: &str) -> Result<String> {
        let url = format!(
            "{}/rest/api/2/issue/{id}?fields={}",
            self.base_url, self.field_key
        );
        let response = self.request(Method::GET, url).send()?;
        Self::check_captcha(&response)?;
        let data: Value = response.error_for_status()?.json()?;

        Ok(data["fields"][self.field_key.as_str()]["value"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    fn set_deployment_status(&self, id: &str, status: Option<&str>) -> Result<()> {
        let value = match status {
            Some(s) => json!({ "value": s }),
            None => Value::Null,
        };
        let mut fields = serde_json::Map::new();
        fields.insert(self.field_key.clone(), value);
        let body = json!({ "fields": fields });

        let url = format!("{}/rest/api/2/issue/{id}", self.base_url);
        let response = self.request(Method::PUT, url).json(&body).send()?;
        Self::check_captcha(&response)?;

        if response.status() != StatusCode::NO_CONTENT {
            let status_code = response.status();
            let detail = response.text().unwrap_or_default();
            return Err(HeraldError::TicketSystem(format!(
                "unexpected status {status_code} while updating issue {id}: {detail}"
            )));
        }
        Ok(())
    }

    fn exchange_credentials(&self, client_id: &str, client_secret: &str) -> Result<String> {
        let body = json!({
            "audience": "api.atlassian.com",
            "grant_type": "client_credentials",
            "client_id": client_id,
            "client_secret": client_secret,
        });

        let data: Value = self
            .client
            .post(format!("{}/oauth/token", self.api_base))
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;

        data.get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                HeraldError::TicketSystem("token endpoint returned no access_token".to_string())
            })
    }

    fn submit_deployments(
        &self,
        records: &[DeploymentRecord],
        token: &str,
    ) -> Result<DeploymentResponse> {
        let cloud_id = self.resolve_cloud_id()?;
        let body = json!({ "deployments": records });

        let response = self
            .client
            .post(format!(
                "{}/jira/deployments/0.1/cloud/{cloud_id}/bulk",
                self.api_base
            ))
            .bearer_auth(token)
            .json(&body)
            .send()?;

        let status = response.status().as_u16();
        let mut rejections = Vec::new();
        if let Ok(data) = response.json::<Value>() {
            for rejected in data["rejectedDeployments"]
                .as_array()
                .map(Vec::as_slice)
                .unwrap_or_default()
            {
                for error in rejected["errors"].as_array().map(Vec::as_slice).unwrap_or_default() {
                    if let Some(message) = error.get("message").and_then(Value::as_str) {
                        rejections.push(message.to_string());
                    }
                }
            }
        }

        Ok(DeploymentResponse { status, rejections })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::build_records;
    use mockito::{Matcher, Server, ServerGuard};

    const FIELDS_BODY: &str = r#"[
        {"key": "summary", "name": "Summary"},
        {"key": "customfield_10200", "name": "Deployed in", "untranslatedName": "Deployed in"}
    ]"#;

    fn server_with_fields() -> ServerGuard {
        let mut server = Server::new();
        server
            .mock("GET", "/rest/api/2/field")
            .with_status(200)
            .with_body(FIELDS_BODY)
            .create();
        server
    }

    fn connect(server: &ServerGuard) -> JiraTicketSystem {
        JiraTicketSystem::connect(
            &server.url(),
            &server.url(),
            "Deployed in",
            "dev@example.com",
            "secret",
            Some("cloud-1".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn connect_resolves_the_field_key() {
        let server = server_with_fields();
        let jira = connect(&server);
        assert_eq!(jira.field_key(), "customfield_10200");
    }

    #[test]
    fn connect_rejects_unknown_fields() {
        let server = server_with_fields();
        let result = JiraTicketSystem::connect(
            &server.url(),
            &server.url(),
            "No Such Field",
            "dev@example.com",
            "secret",
            None,
        );
        assert!(matches!(
            result,
            Err(HeraldError::UnknownJiraField(name)) if name == "No Such Field"
        ));
    }

    #[test]
    fn captcha_lockout_is_a_distinct_error() {
        let mut server = Server::new();
        server
            .mock("GET", "/rest/api/2/field")
            .with_status(403)
            .with_header(SERAPH_LOGIN_HEADER, "AUTHENTICATION_DENIED")
            .create();

        let result = JiraTicketSystem::connect(
            &server.url(),
            &server.url(),
            "Deployed in",
            "dev@example.com",
            "secret",
            None,
        );
        assert!(matches!(result, Err(HeraldError::CaptchaRequired)));
    }

    #[test]
    fn ticket_info_reads_summary_and_builds_browse_url() {
        let mut server = server_with_fields();
        server
            .mock("GET", "/rest/api/2/issue/ABC-1?fields=summary")
            .with_status(200)
            .with_body(r#"{"fields": {"summary": "Fix the login"}}"#)
            .create();

        let jira = connect(&server);
        let info = jira.ticket_info("ABC-1").unwrap();
        assert_eq!(info.id, "ABC-1");
        assert_eq!(info.title, "Fix the login");
        assert_eq!(info.url, format!("{}/browse/ABC-1", server.url()));
    }

    #[test]
    fn ticket_info_propagates_http_errors() {
        let mut server = server_with_fields();
        server
            .mock("GET", "/rest/api/2/issue/NOPE-1?fields=summary")
            .with_status(404)
            .with_body(r#"{"errorMessages": ["Issue does not exist"]}"#)
            .create();

        let jira = connect(&server);
        assert!(jira.ticket_info("NOPE-1").is_err());
    }

    #[test]
    fn deployment_status_reads_the_field_value() {
        let mut server = server_with_fields();
        server
            .mock(
                "GET",
                "/rest/api/2/issue/ABC-1?fields=customfield_10200",
            )
            .with_status(200)
            .with_body(r#"{"fields": {"customfield_10200": {"value": "Staging"}}}"#)
            .create();

        let jira = connect(&server);
        assert_eq!(jira.deployment_status("ABC-1").unwrap(), "Staging");
    }

    #[test]
    fn deployment_status_is_empty_when_unset() {
        let mut server = server_with_fields();
        server
            .mock(
                "GET",
                "/rest/api/2/issue/ABC-1?fields=customfield_10200",
            )
            .with_status(200)
            .with_body(r#"{"fields": {"customfield_10200": null}}"#)
            .create();

        let jira = connect(&server);
        assert_eq!(jira.deployment_status("ABC-1").unwrap(), "");
    }

    #[test]
    fn set_deployment_status_puts_the_field_value() {
        let mut server = server_with_fields();
        let mock = server
            .mock("PUT", "/rest/api/2/issue/ABC-1")
            .match_body(Matcher::PartialJson(json!({
                "fields": {"customfield_10200": {"value": "Staging"}}
            })))
            .with_status(204)
            .create();

        let jira = connect(&server);
        jira.set_deployment_status("ABC-1", Some("Staging")).unwrap();
        mock.assert();
    }

    #[test]
    fn set_deployment_status_clears_with_null() {
        let mut server = server_with_fields();
        let mock = server
            .mock("PUT", "/rest/api/2/issue/ABC-1")
            .match_body(Matcher::PartialJson(json!({
                "fields": {"customfield_10200": null}
            })))
            .with_status(204)
            .create();

        let jira = connect(&server);
        jira.set_deployment_status("ABC-1", None).unwrap();
        mock.assert();
    }

    #[test]
    fn set_deployment_status_rejects_non_204() {
        let mut server = server_with_fields();
        server
            .mock("PUT", "/rest/api/2/issue/ABC-1")
            .with_status(400)
            .with_body(r#"{"errorMessages": ["Field cannot be set"]}"#)
            .create();

        let jira = connect(&server);
        assert!(matches!(
            jira.set_deployment_status("ABC-1", Some("Staging")),
            Err(HeraldError::TicketSystem(_))
        ));
    }

    #[test]
    fn exchange_credentials_returns_the_access_token() {
        let mut server = server_with_fields();
        server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::PartialJson(json!({
                "grant_type": "client_credentials",
                "client_id": "cid",
            })))
            .with_status(200)
            .with_body(r#"{"access_token": "jwt-1", "expires_in": 3600}"#)
            .create();

        let jira = connect(&server);
        assert_eq!(jira.exchange_credentials("cid", "csecret").unwrap(), "jwt-1");
    }

    #[test]
    fn submit_deployments_parses_rejections() {
        let mut server = server_with_fields();
        server
            .mock("POST", "/jira/deployments/0.1/cloud/cloud-1/bulk")
            .with_status(202)
            .with_body(
                r#"{"rejectedDeployments": [
                    {"errors": [{"message": "issue key too old"}, {"message": "bad url"}]}
                ]}"#,
            )
            .create();

        let jira = connect(&server);
        let records = build_records(
            &["ABC-1".to_string()],
            "Production",
            &["https://example.com".to_string()],
            "v1..v2",
            "run1",
            "2026-08-08T10:00:00Z",
        );
        let response = jira.submit_deployments(&records, "jwt-1").unwrap();
        assert_eq!(response.status, 202);
        assert_eq!(response.rejections, vec!["issue key too old", "bad url"]);
        assert!(!response.is_accepted());
    }

    #[test]
    fn submit_deployments_accepts_clean_responses() {
        let mut server = server_with_fields();
        let mock = server
            .mock("POST", "/jira/deployments/0.1/cloud/cloud-1/bulk")
            .match_header("authorization", "Bearer jwt-1")
            .with_status(202)
            .with_body(r#"{"acceptedDeployments": [], "rejectedDeployments": []}"#)
            .create();

        let jira = connect(&server);
        let records = build_records(
            &["ABC-1".to_string()],
            "Production",
            &["https://example.com".to_string()],
            "v1..v2",
            "run1",
            "2026-08-08T10:00:00Z",
        );
        let response = jira.submit_deployments(&records, "jwt-1").unwrap();
        assert!(response.is_accepted());
        mock.assert();
    }

    #[test]
    fn cloud_id_falls_back_to_tenant_info() {
        let mut server = server_with_fields();
        server
            .mock("GET", "/_edge/tenant_info")
            .with_status(200)
            .with_body(r#"{"cloudId": "tenant-9"}"#)
            .create();
        let bulk = server
            .mock("POST", "/jira/deployments/0.1/cloud/tenant-9/bulk")
            .with_status(202)
            .with_body(r#"{"rejectedDeployments": []}"#)
            .create();

        let jira = JiraTicketSystem::connect(
            &server.url(),
            &server.url(),
            "Deployed in",
            "dev@example.com",
            "secret",
            None,
        )
        .unwrap();

        let records = build_records(
            &["ABC-1".to_string()],
            "Staging",
            &["https://staging.example.com".to_string()],
            "v1..v2",
            "run1",
            "2026-08-08T10:00:00Z",
        );
        assert!(jira.submit_deployments(&records, "jwt-1").unwrap().is_accepted());
        bulk.assert();
    }
}
