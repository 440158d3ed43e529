use std::path::Path;
use std::time::Duration;

use stead_core::sync::ResolvedFrom;

use crate::commands::common::open_synced_session;
use crate::error::CliError;

/// Keep a session attached with the debounce clock and auto-sync loop
/// running, reporting server-side overrides as they land.
///
/// Edits made offline since the last attachment are pushed up front; the
/// loop then takes over for anything edited while attached.
pub async fn run_session(site: &str, seconds: u64, db_path: &Path) -> Result<(), CliError> {
    let session = open_synced_session(site, db_path)?;
    let Some(mut applied) = session.subscribe_applied() else {
        return Err(CliError::SyncNotConfigured);
    };

    match session.sync_now().await {
        None => println!("No draft stored yet for {site}"),
        Some(outcome) if !outcome.reached_server => {
            println!("Server unreachable; local draft kept");
        }
        Some(outcome) => match outcome.resolved_from {
            ResolvedFrom::Local => println!("Local draft pushed"),
            ResolvedFrom::Server => println!("Server draft applied"),
        },
    }

    println!("Attached to {site}; background sync is live for {seconds}s (Ctrl-C to stop)");

    let deadline = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline => break,
            result = tokio::signal::ctrl_c() => {
                result?;
                println!();
                break;
            }
            changed = applied.changed() => {
                if changed.is_err() {
                    break;
                }
                let resolved = applied.borrow_and_update().clone();
                if let Some(draft) = resolved {
                    println!(
                        "Server override applied: \"{}\" (updated {})",
                        draft.title, draft.last_updated
                    );
                }
            }
        }
    }

    println!("Session closed; drafts are safe locally");
    Ok(())
}
