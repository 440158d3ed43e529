use std::path::Path;

use stead_core::sync::ResolvedFrom;

use crate::commands::common::open_synced_session;
use crate::error::CliError;

pub async fn run_sync(site: &str, db_path: &Path) -> Result<(), CliError> {
    let session = open_synced_session(site, db_path)?;

    let Some(outcome) = session.sync_now().await else {
        println!("Nothing to sync yet for {site}");
        return Ok(());
    };

    if !outcome.reached_server {
        println!("Server unreachable; local draft kept");
        return Ok(());
    }

    match outcome.resolved_from {
        ResolvedFrom::Local => println!("Synced; local draft is authoritative"),
        ResolvedFrom::Server => println!("Synced; server draft applied"),
    }
    Ok(())
}
