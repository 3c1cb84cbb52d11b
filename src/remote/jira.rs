use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};

use super::IssueSide;
use crate::model::issue::{Issue, IssueComment, IssueFieldSet};

pub struct JiraClient {
    base_url: String,
    auth_header: String,
    client: reqwest::Client,
}

impl JiraClient {
    pub fn new(domain: String, email: String, api_token: String) -> Self {
        let creds = format!("{email}:{api_token}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        Self {
            base_url: format!("https://{domain}.atlassian.net"),
            auth_header: format!("Basic {encoded}"),
            client: reqwest::Client::new(),
        }
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
    }

    /// Issue payloads are `{"fields": {...}}` with project and issuetype
    /// merged into the translated field set.
    fn issue_payload(fields: &IssueFieldSet, project_key: &str, issue_type: &str) -> Result<Value> {
        let mut fields = serde_json::to_value(fields).context("Failed to serialize issue fields")?;
        let obj = fields
            .as_object_mut()
            .context("Issue fields did not serialize to an object")?;
        obj.insert("project".into(), json!({ "key": project_key }));
        obj.insert("issuetype".into(), json!({ "name": issue_type }));
        Ok(json!({ "fields": fields }))
    }
}

const SEARCH_PAGE_SIZE: usize = 100;

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<Issue>,
    #[serde(default)]
    total: usize,
}

#[derive(Deserialize)]
struct CreatedIssue {
    key: String,
}

#[derive(Deserialize)]
struct CommentsResponse {
    #[serde(default)]
    comments: Vec<IssueComment>,
}

#[async_trait]
impl IssueSide for JiraClient {
    async fn search(&self, jql: &str) -> Result<Vec<Issue>> {
        // Jira caps page size, so a busy checkpoint window can span pages.
        let mut issues: Vec<Issue> = Vec::new();
        loop {
            let url = format!(
                "{}/rest/api/2/search?jql={}&startAt={}&maxResults={SEARCH_PAGE_SIZE}",
                self.base_url,
                urlencoding::encode(jql),
                issues.len(),
            );

            let page: SearchResponse = self
                .get(url)
                .send()
                .await
                .context("Jira search failed")?
                .error_for_status()
                .context("Jira search rejected")?
                .json()
                .await
                .context("Failed to parse Jira search response")?;

            let fetched = page.issues.len();
            issues.extend(page.issues);
            if fetched < SEARCH_PAGE_SIZE || issues.len() >= page.total {
                break;
            }
        }
        Ok(issues)
    }

    async fn create_issue(&self, project_key: &str, fields: &IssueFieldSet) -> Result<String> {
        let payload = Self::issue_payload(fields, project_key, "Task")?;

        let created: CreatedIssue = self
            .client
            .post(format!("{}/rest/api/2/issue", self.base_url))
            .header("Authorization", &self.auth_header)
            .json(&payload)
            .send()
            .await
            .context("Jira create issue failed")?
            .error_for_status()
            .context("Jira create issue rejected")?
            .json()
            .await
            .context("Failed to parse created Jira issue")?;
        Ok(created.key)
    }

    async fn update_issue(&self, key: &str, fields: &IssueFieldSet) -> Result<()> {
        // PUT returns 204 with no body.
        self.client
            .put(format!("{}/rest/api/2/issue/{key}", self.base_url))
            .header("Authorization", &self.auth_header)
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .context("Jira update issue failed")?
            .error_for_status()
            .with_context(|| format!("Jira update of {key} rejected"))?;
        Ok(())
    }

    async fn create_subtask(
        &self,
        parent_key: &str,
        summary: &str,
        duedate: Option<&str>,
    ) -> Result<String> {
        // Sub-tasks live in the parent's project, derived from its key prefix.
        let project_key = parent_key.split('-').next().unwrap_or(parent_key);

        let mut fields = json!({
            "project": { "key": project_key },
            "parent": { "key": parent_key },
            "summary": summary,
            "issuetype": { "name": "Sub-task" },
        });
        if let Some(due) = duedate {
            fields["duedate"] = json!(due);
        }

        let created: CreatedIssue = self
            .client
            .post(format!("{}/rest/api/2/issue", self.base_url))
            .header("Authorization", &self.auth_header)
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .context("Jira create sub-task failed")?
            .error_for_status()
            .with_context(|| format!("Jira create sub-task under {parent_key} rejected"))?
            .json()
            .await
            .context("Failed to parse created Jira sub-task")?;
        Ok(created.key)
    }

    async fn get_comments(&self, key: &str) -> Result<Vec<IssueComment>> {
        let url = format!("{}/rest/api/2/issue/{key}/comment", self.base_url);
        let response: CommentsResponse = self
            .get(url)
            .send()
            .await
            .context("Jira comments failed")?
            .error_for_status()
            .with_context(|| format!("Jira comments for {key} rejected"))?
            .json()
            .await
            .context("Failed to parse Jira comments")?;
        Ok(response.comments)
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<IssueComment> {
        let comment = self
            .client
            .post(format!("{}/rest/api/2/issue/{key}/comment", self.base_url))
            .header("Authorization", &self.auth_header)
            .json(&json!({ "body": body }))
            .send()
            .await
            .context("Jira add comment failed")?
            .error_for_status()
            .with_context(|| format!("Jira add comment on {key} rejected"))?
            .json()
            .await
            .context("Failed to parse Jira comment")?;
        Ok(comment)
    }
}
