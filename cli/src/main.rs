//! nimbus - read Microsoft Graph directory data from the terminal.

use anyhow::Context;
use clap::Parser;
use nimbus::commands::{Command, run_with_reauthentication};
use nimbus::config::load_config;
use nimbus::error::AppError;
use nimbus::logger::setup_logger;
use nimbus::session::build_session;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Microsoft Graph client with continuous access evaluation support
#[derive(Parser)]
#[command(name = "nimbus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pre-acquired Graph access token, e.g. from `az account get-access-token --resource-type ms-graph`
    #[arg(long, global = true, env = "NIMBUS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())
        .into_result()
        .map_err(AppError::Config)?;
    config
        .validate(cli.token.is_some())
        .map_err(AppError::Validation)?;

    setup_logger(config.logging()).context("Failed to initialize logger")?;
    log::info!("Starting nimbus {}", env!("CARGO_PKG_VERSION"));

    let session = build_session(&config, cli.token)?;

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupted, cancelling");
            ctrl_c_cancel.cancel();
        }
    });

    let result = run_with_reauthentication(&session, &cli.command, &cancel).await;
    if let Err(e) = &result {
        log::error!("Command failed: {e}");
    }
    Ok(result?)
}
