use anyhow::Result;
use tracing::warn;

use crate::config::Connection;
use crate::remote::IssueSide;

/// Looks up the issue already linked to `card_id`, scoped to the
/// connection's project. One remote read per call; the engine resolves each
/// candidate id at most once per pass.
///
/// More than one match means the link invariant was already broken by
/// earlier data damage; the first match is used and a warning logged.
pub async fn find_linked_issue(
    issues: &dyn IssueSide,
    conn: &Connection,
    card_id: &str,
) -> Result<Option<String>> {
    let jql = format!(
        "project={} AND \"{}\" = \"{}\"",
        conn.jira.project_key, conn.jira.link_field, card_id
    );
    let matches = issues.search(&jql).await?;

    if matches.len() > 1 {
        warn!(
            connection = %conn.name,
            card_id,
            matches = matches.len(),
            "Multiple issues linked to one card; using the first"
        );
    }
    Ok(matches.into_iter().next().map(|issue| issue.key))
}
