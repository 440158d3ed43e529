//! Stead CLI - edit site drafts from the command line
//!
//! Drafts live in a local store and survive offline work; syncing with the
//! hosting service happens explicitly (`stead sync`) or in the background
//! during an attended session (`stead session`).

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::common::resolve_db_path;
use crate::error::CliError;

mod cli;
mod commands;
mod error;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stead=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Show { site, json } => commands::show::run_show(&site, json, &db_path).await?,
        Commands::Title { site, text } => {
            commands::set::run_set_title(&site, &text.join(" "), &db_path).await?;
        }
        Commands::Describe { site, text } => {
            commands::set::run_set_description(&site, &text.join(" "), &db_path).await?;
        }
        Commands::Compose { site } => commands::compose::run_compose(&site, &db_path).await?,
        Commands::Sync { site } => commands::sync::run_sync(&site, &db_path).await?,
        Commands::Session { site, seconds } => {
            commands::session::run_session(&site, seconds, &db_path).await?;
        }
        Commands::Completions { shell, output } => {
            commands::completions::run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
