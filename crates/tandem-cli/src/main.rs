//! Tandem CLI - local-first notes with conflict-aware sync
//!
//! Works against the local database only; remote forwards are recorded in
//! memory and dropped when the command exits.

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::{load_settings, resolve_db_path};
use crate::commands::completions::run_completions;
use crate::commands::delete::run_delete;
use crate::commands::list::run_list;
use crate::commands::lock::run_set_locked;
use crate::commands::merge::run_merge;
use crate::commands::replay::run_replay;
use crate::commands::show::run_show;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {}", error.user_message());
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "tandem=info"
        .parse::<tracing_subscriber::filter::Directive>()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);
    let config_path = cli.config;

    match cli.command {
        Commands::Merge { old, new, lines } => run_merge(&old, &new, lines)?,
        Commands::Add { content, kind } => {
            let settings = load_settings(config_path.as_deref())?;
            run_add(&content, &kind, &db_path, settings).await?;
        }
        Commands::List { limit, json } => run_list(limit, json, &db_path).await?,
        Commands::Show { id, json } => run_show(&id, json, &db_path).await?,
        Commands::Lock { id } => {
            let settings = load_settings(config_path.as_deref())?;
            run_set_locked(&id, true, &db_path, settings).await?;
        }
        Commands::Unlock { id } => {
            let settings = load_settings(config_path.as_deref())?;
            run_set_locked(&id, false, &db_path, settings).await?;
        }
        Commands::Delete { id } => {
            let settings = load_settings(config_path.as_deref())?;
            run_delete(&id, &db_path, settings).await?;
        }
        Commands::Replay { events } => {
            let settings = load_settings(config_path.as_deref())?;
            run_replay(&events, &db_path, settings).await?;
        }
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
