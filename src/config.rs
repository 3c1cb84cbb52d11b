use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Checkpoint file; defaults to `<data dir>/state.json`.
    pub state_file: Option<PathBuf>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// One board↔project binding. Immutable for the duration of a pass; each
/// connection carries its own checkpoint, keyed by `name`.
#[derive(Debug, Deserialize)]
pub struct Connection {
    pub name: String,
    pub trello: TrelloConfig,
    pub jira: JiraConfig,
    /// Fields propagated between the two sides; omitted means all.
    #[serde(default = "all_fields")]
    pub fields: Vec<SyncField>,
}

impl Connection {
    pub fn enabled(&self, field: SyncField) -> bool {
        self.fields.contains(&field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncField {
    Title,
    Description,
    DueDate,
}

fn all_fields() -> Vec<SyncField> {
    vec![SyncField::Title, SyncField::Description, SyncField::DueDate]
}

#[derive(Debug, Deserialize)]
pub struct TrelloConfig {
    pub api_key: String,
    pub token: String,
    pub board_id: String,
    /// Restrict the board→issue pass to cards in these lists. Empty means
    /// every list on the board.
    #[serde(default)]
    pub list_ids: Vec<String>,
    /// OAuth refresh credentials; when present, a 401 mid-pass triggers one
    /// token refresh and retry.
    pub oauth: Option<TrelloOauthConfig>,
}

impl TrelloConfig {
    pub fn allows_list(&self, list_id: Option<&str>) -> bool {
        if self.list_ids.is_empty() {
            return true;
        }
        list_id.is_some_and(|id| self.list_ids.iter().any(|allowed| allowed == id))
    }
}

#[derive(Debug, Deserialize)]
pub struct TrelloOauthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct JiraConfig {
    pub domain: String,
    pub email: String,
    pub api_token: String,
    pub project_key: String,
    /// Custom field id on the issue side holding the Trello card id.
    pub link_field: String,
    /// Board mention name → issue mention name.
    #[serde(default)]
    pub user_mapping: HashMap<String, String>,
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".boardsync")
}

pub fn default_state_file() -> PathBuf {
    data_dir().join("state.json")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

impl Config {
    /// Fail-fast validation before any remote call. Every missing value is
    /// reported in one error, not one at a time.
    pub fn validate(&self) -> Result<()> {
        if self.connections.is_empty() {
            bail!("No connections configured");
        }

        let mut missing = Vec::new();
        for (index, conn) in self.connections.iter().enumerate() {
            let prefix = if conn.name.trim().is_empty() {
                missing.push(format!("connections[{index}].name"));
                format!("connections[{index}]")
            } else {
                format!("connections.{}", conn.name)
            };

            let mut require = |value: &str, field: &str| {
                if value.trim().is_empty() {
                    missing.push(format!("{prefix}.{field}"));
                }
            };
            require(&conn.trello.api_key, "trello.api_key");
            require(&conn.trello.token, "trello.token");
            require(&conn.trello.board_id, "trello.board_id");
            require(&conn.jira.domain, "jira.domain");
            require(&conn.jira.email, "jira.email");
            require(&conn.jira.api_token, "jira.api_token");
            require(&conn.jira.project_key, "jira.project_key");
            require(&conn.jira.link_field, "jira.link_field");
        }

        if !missing.is_empty() {
            bail!(
                "Missing required configuration values: {}",
                missing.join(", ")
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        state_file = "/tmp/sync-state.json"

        [[connections]]
        name = "main"
        fields = ["title", "due_date"]

        [connections.trello]
        api_key = "k"
        token = "t"
        board_id = "b1"
        list_ids = ["l1", "l2"]

        [connections.jira]
        domain = "acme"
        email = "bot@acme.example"
        api_token = "jt"
        project_key = "PROJ"
        link_field = "customfield_10042"

        [connections.jira.user_mapping]
        alice = "a.user"
    "#;

    #[test]
    fn parse_full_config() {
        let config: Config = toml::from_str(FULL).unwrap();
        assert_eq!(
            config.state_file,
            Some(PathBuf::from("/tmp/sync-state.json"))
        );
        assert_eq!(config.connections.len(), 1);

        let conn = &config.connections[0];
        assert_eq!(conn.name, "main");
        assert!(conn.enabled(SyncField::Title));
        assert!(!conn.enabled(SyncField::Description));
        assert!(conn.enabled(SyncField::DueDate));
        assert_eq!(conn.trello.list_ids, vec!["l1", "l2"]);
        assert_eq!(conn.jira.user_mapping["alice"], "a.user");
        assert!(conn.trello.oauth.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn fields_default_to_all() {
        let toml = FULL.replace("fields = [\"title\", \"due_date\"]", "");
        let config: Config = toml::from_str(&toml).unwrap();
        let conn = &config.connections[0];
        assert!(conn.enabled(SyncField::Title));
        assert!(conn.enabled(SyncField::Description));
        assert!(conn.enabled(SyncField::DueDate));
    }

    #[test]
    fn validate_enumerates_all_missing_values() {
        let toml = FULL
            .replace("api_key = \"k\"", "api_key = \"\"")
            .replace("project_key = \"PROJ\"", "project_key = \"\"");
        let config: Config = toml::from_str(&toml).unwrap();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("connections.main.trello.api_key"), "{err}");
        assert!(err.contains("connections.main.jira.project_key"), "{err}");
    }

    #[test]
    fn validate_rejects_empty_connections() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn list_filter_allows_everything_when_unset() {
        let config: Config = toml::from_str(FULL).unwrap();
        let mut trello = config.connections.into_iter().next().unwrap().trello;

        assert!(trello.allows_list(Some("l1")));
        assert!(!trello.allows_list(Some("other")));
        assert!(!trello.allows_list(None));

        trello.list_ids.clear();
        assert!(trello.allows_list(Some("other")));
        assert!(trello.allows_list(None));
    }
}
