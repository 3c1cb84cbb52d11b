mod cli;
mod config;
mod model;
mod remote;
mod state;
mod sync;
mod token;

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = match cli::parse_args(&args) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}\n");
            cli::print_help();
            return ExitCode::FAILURE;
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Non-zero exit on any fatal error so a scheduler can alert.
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: cli::CliArgs) -> Result<()> {
    let config = config::load_config(&args.config)?;
    config.validate()?;

    let state_path = args
        .state
        .or_else(|| config.state_file.clone())
        .unwrap_or_else(config::default_state_file);
    let mut store = state::StateStore::open(state_path)?;

    let selected: Vec<&config::Connection> = match args.connection {
        Some(index) => {
            let conn = config.connections.get(index).with_context(|| {
                format!(
                    "connection index {index} out of range (0-{})",
                    config.connections.len() - 1
                )
            })?;
            vec![conn]
        }
        None => config.connections.iter().collect(),
    };

    // Connections are independent but run sequentially; each holds its own
    // checkpoint and credentials.
    for conn in selected {
        sync::run_connection(conn, &mut store).await?;
    }
    Ok(())
}
