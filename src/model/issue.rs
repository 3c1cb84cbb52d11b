use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub key: String,
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueFields {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub duedate: Option<String>,
    /// Custom fields keyed by their configured id (e.g. `customfield_10042`).
    /// The link field lives here because its key is per-connection config.
    #[serde(flatten)]
    pub custom: HashMap<String, Value>,
}

impl IssueFields {
    /// The board-side card id stored in the configured link field, if any.
    pub fn link_value(&self, link_field: &str) -> Option<&str> {
        self.custom.get(link_field).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueComment {
    pub id: String,
    #[serde(default)]
    pub body: String,
}

/// Outbound issue fields. Disabled or absent fields are omitted entirely,
/// never sent as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssueFieldSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duedate: Option<String>,
    /// Custom field assignments. The link field is set through here exactly
    /// once, at issue creation, and never rewritten on update.
    #[serde(flatten)]
    pub custom: HashMap<String, String>,
}

impl IssueFieldSet {
    pub fn with_link(mut self, link_field: &str, card_id: &str) -> Self {
        self.custom
            .insert(link_field.to_string(), card_id.to_string());
        self
    }
}
