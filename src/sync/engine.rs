use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};

use crate::config::{Connection, SyncField};
use crate::model::card::Card;
use crate::model::issue::Issue;
use crate::remote::{BoardSide, IssueSide};

use super::link::find_linked_issue;
use super::translate;

/// Terminal state for one record in a one-directional pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Created,
    Updated,
    /// Outside the configured list filter, or an issue with no link value.
    SkippedFiltered,
    /// Failed per-record translation; logged and passed over.
    SkippedInvalid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub created: usize,
    pub updated: usize,
    pub filtered: usize,
    pub invalid: usize,
}

impl PassSummary {
    fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Created => self.created += 1,
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::SkippedFiltered => self.filtered += 1,
            RecordOutcome::SkippedInvalid => self.invalid += 1,
        }
    }
}

/// Drives one bidirectional reconciliation pass for a single connection.
/// Strictly sequential: record by record, no overlapping remote calls, so
/// link resolution always sees the effects of earlier writes in the pass.
pub struct SyncEngine<'a> {
    board: &'a dyn BoardSide,
    issues: &'a dyn IssueSide,
    conn: &'a Connection,
}

impl<'a> SyncEngine<'a> {
    pub fn new(board: &'a dyn BoardSide, issues: &'a dyn IssueSide, conn: &'a Connection) -> Self {
        Self { board, issues, conn }
    }

    /// Runs the board→issue pass, then the issue→board pass, over the same
    /// checkpoint window. Returns the pass start time, captured before the
    /// first remote call; the caller persists it as the new checkpoint only
    /// because this returned without error.
    pub async fn run_pass(&self, last_sync: &str) -> Result<(String, PassSummary)> {
        let started_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut summary = PassSummary::default();

        self.board_to_issues(last_sync, &mut summary).await?;
        self.issues_to_board(last_sync, &mut summary).await?;

        Ok((started_at, summary))
    }

    async fn board_to_issues(&self, last_sync: &str, summary: &mut PassSummary) -> Result<()> {
        let cards = self
            .board
            .list_changed(&self.conn.trello.board_id, last_sync)
            .await
            .context("Failed to list changed cards")?;
        debug!(connection = %self.conn.name, cards = cards.len(), "Board→issue window");

        for card in cards {
            let outcome = self.push_card(&card).await.with_context(|| {
                format!("connection {}: card {} failed", self.conn.name, card.id)
            })?;
            summary.record(outcome);
        }
        Ok(())
    }

    async fn push_card(&self, card: &Card) -> Result<RecordOutcome> {
        if !self.conn.trello.allows_list(card.id_list.as_deref()) {
            return Ok(RecordOutcome::SkippedFiltered);
        }

        let attachments = if self.conn.enabled(SyncField::Description) {
            self.board.get_attachments(&card.id).await?
        } else {
            Vec::new()
        };

        let fields = match translate::to_issue_fields(card, &attachments, self.conn) {
            Ok(fields) => fields,
            Err(err) => {
                warn!(connection = %self.conn.name, card = %card.id, %err, "Skipping untranslatable card");
                return Ok(RecordOutcome::SkippedInvalid);
            }
        };

        match find_linked_issue(self.issues, self.conn, &card.id).await? {
            Some(key) => {
                info!(connection = %self.conn.name, card = %card.id, issue = %key, "Updating linked issue");
                self.issues.update_issue(&key, &fields).await?;
                self.mirror_card_comments(&card.id, &key).await?;
                Ok(RecordOutcome::Updated)
            }
            None => {
                let fields = fields.with_link(&self.conn.jira.link_field, &card.id);
                let key = self
                    .issues
                    .create_issue(&self.conn.jira.project_key, &fields)
                    .await?;
                info!(connection = %self.conn.name, card = %card.id, issue = %key, "Created issue for card");

                // Checklist fan-out happens only on create; a later update
                // of the same card must not duplicate sub-tasks.
                for checklist in self.board.get_checklists(&card.id).await? {
                    for item in &checklist.check_items {
                        self.issues
                            .create_subtask(&key, &item.name, card.due.as_deref())
                            .await?;
                    }
                }

                self.mirror_card_comments(&card.id, &key).await?;
                Ok(RecordOutcome::Created)
            }
        }
    }

    /// Appends every comment in the window's source record to its
    /// counterpart. Not idempotent against re-delivery; the checkpoint
    /// window bounds re-posting to records that actually changed.
    async fn mirror_card_comments(&self, card_id: &str, issue_key: &str) -> Result<()> {
        for comment in self.board.get_comments(card_id).await? {
            let text = translate::convert_mentions(&comment.data.text, &self.conn.jira.user_mapping);
            self.issues.add_comment(issue_key, &text).await?;
        }
        Ok(())
    }

    async fn issues_to_board(&self, last_sync: &str, summary: &mut PassSummary) -> Result<()> {
        let jql = format!(
            "project={} AND updated > \"{}\"",
            self.conn.jira.project_key, last_sync
        );
        let issues = self
            .issues
            .search(&jql)
            .await
            .context("Failed to search changed issues")?;
        debug!(connection = %self.conn.name, issues = issues.len(), "Issue→board window");

        let inverse_mapping = translate::invert(&self.conn.jira.user_mapping);
        for issue in issues {
            let outcome = self
                .push_issue(&issue, &inverse_mapping)
                .await
                .with_context(|| {
                    format!("connection {}: issue {} failed", self.conn.name, issue.key)
                })?;
            summary.record(outcome);
        }
        Ok(())
    }

    async fn push_issue(
        &self,
        issue: &Issue,
        inverse_mapping: &HashMap<String, String>,
    ) -> Result<RecordOutcome> {
        // The issue carries the card id in its link field directly; issues
        // that never came from the board have no counterpart and creating
        // one could never be linked back, so they are skipped.
        let Some(card_id) = issue
            .fields
            .link_value(&self.conn.jira.link_field)
            .map(str::to_string)
        else {
            return Ok(RecordOutcome::SkippedFiltered);
        };

        let fields = match translate::to_card_fields(issue, inverse_mapping, self.conn) {
            Ok(fields) => fields,
            Err(err) => {
                warn!(connection = %self.conn.name, issue = %issue.key, %err, "Skipping untranslatable issue");
                return Ok(RecordOutcome::SkippedInvalid);
            }
        };

        if fields.is_empty() {
            debug!(connection = %self.conn.name, issue = %issue.key, card = %card_id, "No card fields to update");
        } else {
            info!(connection = %self.conn.name, issue = %issue.key, card = %card_id, "Updating linked card");
            self.board.update_card(&card_id, &fields).await?;
        }

        for comment in self.issues.get_comments(&issue.key).await? {
            let text = translate::convert_mentions(&comment.body, inverse_mapping);
            self.board.add_comment(&card_id, &text).await?;
        }
        Ok(RecordOutcome::Updated)
    }
}
