use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// First-run checkpoint: everything is considered unsynced.
pub const EPOCH: &str = "1970-01-01T00:00:00Z";

/// Last-successful-sync checkpoints, one per connection name, persisted as
/// a JSON map. Read at pass start, written once per successful pass.
pub struct StateStore {
    path: PathBuf,
    data: HashMap<String, String>,
}

impl StateStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read state from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Malformed state file {}", path.display()))?
        } else {
            HashMap::new()
        };
        Ok(Self { path, data })
    }

    /// Last successful sync for `connection`, or the epoch on first run.
    pub fn last_sync(&self, connection: &str) -> &str {
        self.data
            .get(connection)
            .map(String::as_str)
            .unwrap_or(EPOCH)
    }

    /// Records a completed pass. The file is replaced via a temp file and
    /// rename so a crash mid-write cannot lose the previous checkpoint.
    pub fn advance(&mut self, connection: &str, timestamp: &str) -> Result<()> {
        self.data
            .insert(connection.to_string(), timestamp.to_string());
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}
