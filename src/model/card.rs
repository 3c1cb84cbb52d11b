use serde::{Deserialize, Serialize};

/// A Trello card as returned by the boards/{id}/cards endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    pub due: Option<String>,
    pub id_list: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Checklist {
    pub id: String,
    #[serde(default, rename = "checkItems")]
    pub check_items: Vec<CheckItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckItem {
    pub name: String,
}

/// A `commentCard` action. Trello nests the comment text under `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct CardComment {
    pub id: String,
    pub data: CommentData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentData {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    pub url: String,
}

/// Outbound partial card update. `None` fields are never sent, so an
/// absent source value leaves the remote value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CardFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
}

impl CardFields {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.desc.is_none() && self.due.is_none()
    }
}
