pub mod engine;
pub mod link;
pub mod translate;


use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::config::Connection;
use crate::remote::{jira::JiraClient, trello::TrelloClient, BoardSide, IssueSide, Unauthorized};
use crate::state::StateStore;
use crate::token::{AccessToken, RefreshTokens, TrelloTokenStore};

use engine::{PassSummary, SyncEngine};

/// Runs one connection end to end: build clients, run a bidirectional pass,
/// persist the checkpoint.
pub async fn run_connection(conn: &Connection, store: &mut StateStore) -> Result<()> {
    let last_sync = store.last_sync(&conn.name).to_string();
    info!(connection = %conn.name, %last_sync, "Starting sync pass");

    let jira = JiraClient::new(
        conn.jira.domain.clone(),
        conn.jira.email.clone(),
        conn.jira.api_token.clone(),
    );
    let trello = TrelloClient::new(conn.trello.api_key.clone(), conn.trello.token.clone());
    let mut tokens = conn.trello.oauth.as_ref().map(TrelloTokenStore::new);

    let (checkpoint, summary) = run_with_token_retry(
        &trello,
        &jira,
        conn,
        &last_sync,
        tokens.as_mut().map(|t| t as &mut dyn RefreshTokens),
        |access| Box::new(TrelloClient::new(conn.trello.api_key.clone(), access.token.clone())),
    )
    .await?;

    // Only reached when both directions completed; a failed pass leaves the
    // checkpoint untouched so the next run retries the same window.
    store.advance(&conn.name, &checkpoint)?;
    info!(
        connection = %conn.name,
        created = summary.created,
        updated = summary.updated,
        filtered = summary.filtered,
        invalid = summary.invalid,
        %checkpoint,
        "Sync pass complete"
    );
    Ok(())
}

/// One bidirectional pass with the authorization retry policy: a pass that
/// fails unauthorized triggers exactly one token refresh and one retry
/// against a rebuilt board client; a second 401 propagates as fatal.
/// Without refresh credentials the original error is returned unchanged.
pub(crate) async fn run_with_token_retry<F>(
    board: &dyn BoardSide,
    issues: &dyn IssueSide,
    conn: &Connection,
    last_sync: &str,
    tokens: Option<&mut dyn RefreshTokens>,
    rebuild: F,
) -> Result<(String, PassSummary)>
where
    F: FnOnce(&AccessToken) -> Box<dyn BoardSide>,
{
    match run_pass(board, issues, conn, last_sync).await {
        Err(err) if is_unauthorized(&err) => {
            let Some(tokens) = tokens else { return Err(err) };
            warn!(connection = %conn.name, "Trello rejected credentials; refreshing token and retrying");
            let access = tokens.refresh().await.context("Trello token refresh failed")?;
            if access.is_expired() {
                bail!("Refreshed Trello token is already expired; not retrying");
            }
            let board = rebuild(&access);
            run_pass(board.as_ref(), issues, conn, last_sync).await
        }
        done => done,
    }
}

async fn run_pass(
    board: &dyn BoardSide,
    issues: &dyn IssueSide,
    conn: &Connection,
    last_sync: &str,
) -> Result<(String, PassSummary)> {
    SyncEngine::new(board, issues, conn).run_pass(last_sync).await
}

fn is_unauthorized(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.downcast_ref::<Unauthorized>().is_some()
            || cause
                .downcast_ref::<reqwest::Error>()
                .and_then(reqwest::Error::status)
                == Some(reqwest::StatusCode::UNAUTHORIZED)
    })
}
