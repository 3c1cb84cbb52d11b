pub mod jira;
pub mod trello;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::card::{Attachment, Card, CardComment, CardFields, Checklist};
use crate::model::issue::{Issue, IssueComment, IssueFieldSet};

/// Authorization failure from either side. Implementations may surface this
/// directly; the reqwest clients surface HTTP 401 instead, and the retry
/// path in `sync` treats both the same way.
#[derive(Debug, thiserror::Error)]
#[error("remote rejected credentials")]
pub struct Unauthorized;

/// Board-side record store (Trello). One method per remote operation the
/// sync engine performs; implementations hold no mutable state across calls.
#[async_trait]
pub trait BoardSide: Send + Sync {
    /// Cards on `board_id` changed after `since` (RFC 3339 UTC).
    async fn list_changed(&self, board_id: &str, since: &str) -> Result<Vec<Card>>;
    async fn get_checklists(&self, card_id: &str) -> Result<Vec<Checklist>>;
    /// Comments in creation order.
    async fn get_comments(&self, card_id: &str) -> Result<Vec<CardComment>>;
    async fn get_attachments(&self, card_id: &str) -> Result<Vec<Attachment>>;
    async fn create_card(&self, list_id: &str, fields: &CardFields) -> Result<Card>;
    async fn update_card(&self, card_id: &str, fields: &CardFields) -> Result<Card>;
    async fn add_comment(&self, card_id: &str, text: &str) -> Result<CardComment>;
}

/// Issue-side record store (Jira).
#[async_trait]
pub trait IssueSide: Send + Sync {
    async fn search(&self, jql: &str) -> Result<Vec<Issue>>;
    /// Creates an issue and returns its key.
    async fn create_issue(&self, project_key: &str, fields: &IssueFieldSet) -> Result<String>;
    async fn update_issue(&self, key: &str, fields: &IssueFieldSet) -> Result<()>;
    /// Creates a sub-task under `parent_key` and returns its key.
    async fn create_subtask(
        &self,
        parent_key: &str,
        summary: &str,
        duedate: Option<&str>,
    ) -> Result<String>;
    async fn get_comments(&self, key: &str) -> Result<Vec<IssueComment>>;
    async fn add_comment(&self, key: &str, body: &str) -> Result<IssueComment>;
}
