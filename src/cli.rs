use anyhow::{bail, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub config: PathBuf,
    /// Overrides both the config file's `state_file` and the default.
    pub state: Option<PathBuf>,
    /// Run only this connection; all of them when unset.
    pub connection: Option<usize>,
    pub help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            config: PathBuf::from("boardsync.toml"),
            state: None,
            connection: None,
            help: false,
        }
    }
}

/// Parse CLI args for `boardsync`.
///
/// Supported forms:
///   boardsync
///   boardsync --config sync.toml
///   boardsync --connection 0 --state /var/lib/boardsync/state.json
pub fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => parsed.help = true,
            "-c" | "--config" => {
                i += 1;
                match args.get(i) {
                    Some(value) => parsed.config = PathBuf::from(value),
                    None => bail!("Missing value for -c/--config flag"),
                }
            }
            "--state" => {
                i += 1;
                match args.get(i) {
                    Some(value) => parsed.state = Some(PathBuf::from(value)),
                    None => bail!("Missing value for --state flag"),
                }
            }
            "-n" | "--connection" => {
                i += 1;
                match args.get(i) {
                    Some(value) => {
                        let index = value
                            .parse()
                            .map_err(|_| anyhow::anyhow!("Invalid connection index: {value}"))?;
                        parsed.connection = Some(index);
                    }
                    None => bail!("Missing value for -n/--connection flag"),
                }
            }
            other => bail!("Unknown argument: {other}"),
        }
        i += 1;
    }

    Ok(parsed)
}

pub fn print_help() {
    println!("boardsync — bidirectional Trello ↔ Jira sync\n");
    println!("USAGE:");
    println!("  boardsync [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -c, --config <path>    Config file (default: boardsync.toml)");
    println!("  -n, --connection <i>   Sync only the connection at this index");
    println!("      --state <path>     Checkpoint file override");
    println!("  -h, --help             Show this help");
    println!();
    println!("Runs one checkpointed sync pass per connection and exits;");
    println!("schedule it with cron or a systemd timer.");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_no_args_uses_defaults() {
        let parsed = parse_args(&args(&[])).unwrap();
        assert_eq!(parsed, CliArgs::default());
    }

    #[test]
    fn parse_config_flag() {
        let parsed = parse_args(&args(&["--config", "/etc/boardsync.toml"])).unwrap();
        assert_eq!(parsed.config, PathBuf::from("/etc/boardsync.toml"));

        let parsed = parse_args(&args(&["-c", "other.toml"])).unwrap();
        assert_eq!(parsed.config, PathBuf::from("other.toml"));
    }

    #[test]
    fn parse_connection_index() {
        let parsed = parse_args(&args(&["--connection", "2"])).unwrap();
        assert_eq!(parsed.connection, Some(2));
    }

    #[test]
    fn parse_state_override() {
        let parsed = parse_args(&args(&["--state", "/tmp/s.json"])).unwrap();
        assert_eq!(parsed.state, Some(PathBuf::from("/tmp/s.json")));
    }

    #[test]
    fn parse_help_flag() {
        assert!(parse_args(&args(&["--help"])).unwrap().help);
        assert!(parse_args(&args(&["-h"])).unwrap().help);
    }

    #[test]
    fn parse_invalid_connection_index_fails() {
        let result = parse_args(&args(&["--connection", "two"]));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid connection index"));
    }

    #[test]
    fn parse_missing_flag_value_fails() {
        let result = parse_args(&args(&["--config"]));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Missing value"));
    }

    #[test]
    fn parse_unknown_argument_fails() {
        let result = parse_args(&args(&["--frobnicate"]));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unknown argument"));
    }
}
