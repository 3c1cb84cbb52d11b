use std::collections::HashMap;

use thiserror::Error;

use crate::config::{Connection, SyncField};
use crate::model::card::{Attachment, Card, CardFields};
use crate::model::issue::{Issue, IssueFieldSet};

/// Per-record translation failure. Callers skip the record and continue;
/// transport errors abort the whole pass instead.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("record {id} has no usable {field}")]
    MissingField { id: String, field: &'static str },
}

/// Rewrites `@name` mention tokens using `mapping`. Unmapped names pass
/// through unchanged; everything outside mentions is preserved byte for
/// byte, so the substitution is total and order-preserving.
pub fn convert_mentions(text: &str, mapping: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find('@') {
        out.push_str(&rest[..=at]);
        rest = &rest[at + 1..];
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.' || c == '-'))
            .unwrap_or(rest.len());
        let name = &rest[..end];
        match mapping.get(name) {
            Some(mapped) => out.push_str(mapped),
            None => out.push_str(name),
        }
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

/// Issue→board direction uses the inverted mention table.
pub fn invert(mapping: &HashMap<String, String>) -> HashMap<String, String> {
    mapping.iter().map(|(k, v)| (v.clone(), k.clone())).collect()
}

/// Projects a card onto the issue schema, honoring the connection's enabled
/// field set. Attachment references become `Attachment: <url>` lines after
/// the body, in input order. The link field is not set here; creation is
/// the only place that assigns it.
pub fn to_issue_fields(
    card: &Card,
    attachments: &[Attachment],
    conn: &Connection,
) -> Result<IssueFieldSet, TranslateError> {
    let mut fields = IssueFieldSet::default();

    if conn.enabled(SyncField::Title) {
        if card.name.trim().is_empty() {
            return Err(TranslateError::MissingField {
                id: card.id.clone(),
                field: "name",
            });
        }
        fields.summary = Some(card.name.clone());
    }

    if conn.enabled(SyncField::Description) {
        let mut desc = convert_mentions(&card.desc, &conn.jira.user_mapping);
        for attachment in attachments {
            desc.push_str("\nAttachment: ");
            desc.push_str(&attachment.url);
        }
        fields.description = Some(desc);
    }

    if conn.enabled(SyncField::DueDate) {
        // Absent due dates are omitted, never cleared on the other side.
        fields.duedate = card.due.clone();
    }

    Ok(fields)
}

/// Projects an issue onto the card schema. `inverse_mapping` is the
/// inverted mention table, computed once per pass by the caller.
pub fn to_card_fields(
    issue: &Issue,
    inverse_mapping: &HashMap<String, String>,
    conn: &Connection,
) -> Result<CardFields, TranslateError> {
    let mut fields = CardFields::default();

    if conn.enabled(SyncField::Title) {
        match issue.fields.summary.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(summary) => fields.name = Some(summary.to_string()),
            None => {
                return Err(TranslateError::MissingField {
                    id: issue.key.clone(),
                    field: "summary",
                })
            }
        }
    }

    if conn.enabled(SyncField::Description) {
        if let Some(desc) = &issue.fields.description {
            fields.desc = Some(convert_mentions(desc, inverse_mapping));
        }
    }

    if conn.enabled(SyncField::DueDate) {
        fields.due = issue.fields.duedate.clone();
    }

    Ok(fields)
}
