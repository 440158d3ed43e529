use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use stead_core::config::SyncConfig;
use stead_core::db::{Database, DraftStore, SqliteDraftStore};
use stead_core::editor::EditSession;
use stead_core::sync::{RemoteSyncClient, SyncService};
use stead_core::SiteId;

use crate::error::CliError;

/// Resolve the draft database path: flag, then env, then platform default.
pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("STEAD_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stead")
        .join("stead.db")
}

/// Open the local draft store, creating parent directories as needed.
pub fn open_store(db_path: &Path) -> Result<Arc<SqliteDraftStore>, CliError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::open(db_path)?;
    Ok(Arc::new(SqliteDraftStore::new(Arc::new(db))))
}

/// Build a sync client from `STEAD_SYNC_URL` / `STEAD_COOKIES`.
///
/// Returns `Ok(None)` when sync is simply not configured; a configured but
/// invalid URL is a hard error rather than silent offline mode.
pub fn sync_service_from_env() -> Result<Option<Arc<dyn SyncService>>, CliError> {
    let Some(url) = env::var("STEAD_SYNC_URL").ok().filter(|url| !url.is_empty()) else {
        return Ok(None);
    };

    let mut client = RemoteSyncClient::new(url)?;
    if let Ok(cookies) = env::var("STEAD_COOKIES") {
        if !cookies.is_empty() {
            client = client.with_cookies(cookies);
        }
    }
    tracing::info!("Sync enabled against {}", client.base_url());
    Ok(Some(Arc::new(client)))
}

/// Open an edit session; wired to the remote authority when configured,
/// local-only otherwise.
pub fn open_session(site: &str, db_path: &Path) -> Result<EditSession, CliError> {
    let site = site.parse::<SiteId>()?;
    let store = open_store(db_path)? as Arc<dyn DraftStore>;

    match sync_service_from_env()? {
        Some(service) => {
            Ok(EditSession::open_with_sync(site, store, service, SyncConfig::default())?)
        }
        None => Ok(EditSession::open(site, store)?),
    }
}

/// Open an edit session that must be able to sync.
pub fn open_synced_session(site: &str, db_path: &Path) -> Result<EditSession, CliError> {
    let site = site.parse::<SiteId>()?;
    let store = open_store(db_path)? as Arc<dyn DraftStore>;
    let service = sync_service_from_env()?.ok_or(CliError::SyncNotConfigured)?;
    Ok(EditSession::open_with_sync(
        site,
        store,
        service,
        SyncConfig::default(),
    )?)
}

/// Open `$VISUAL`/`$EDITOR` on the given initial text and return what the
/// user saved, or `None` when the buffer came back empty.
pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_draft_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let edited = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    let trimmed = edited.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            // Fallback for editor commands with args, e.g. "code --wait"
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

fn create_temp_draft_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("stead-draft-{}-{now}.json", std::process::id()))
}

/// Relative time formatting for draft listings, from Unix seconds.
pub fn format_relative_time(timestamp: i64, now: i64) -> String {
    let diff = now.saturating_sub(timestamp);
    let minute = 60;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if timestamp == 0 {
        "never".to_string()
    } else if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}
