use std::path::Path;

use serde::Serialize;
use stead_core::Draft;

use crate::commands::common::{format_relative_time, open_session};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct DraftView<'a> {
    site: &'a str,
    #[serde(flatten)]
    draft: &'a Draft,
}

pub async fn run_show(site: &str, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let session = open_session(site, db_path)?;
    let draft = session.draft();

    if as_json {
        let view = DraftView {
            site: session.site().as_str(),
            draft: &draft,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    for line in format_draft_lines(session.site().as_str(), &draft) {
        println!("{line}");
    }
    Ok(())
}

fn format_draft_lines(site: &str, draft: &Draft) -> Vec<String> {
    let now = stead_core::util::unix_timestamp_now();
    let title = if draft.title.is_empty() {
        "(untitled)"
    } else {
        draft.title.as_str()
    };

    let mut lines = vec![
        format!("{site}  {title}"),
        format!("  updated {}", format_relative_time(draft.last_updated, now)),
    ];
    if !draft.description.is_empty() {
        lines.push(format!("  {}", draft.description));
    }
    lines.push(format!("  blocks: {}", block_count(draft)));
    lines
}

fn block_count(draft: &Draft) -> usize {
    draft
        .content
        .get("blocks")
        .and_then(serde_json::Value::as_array)
        .map_or(0, Vec::len)
}
