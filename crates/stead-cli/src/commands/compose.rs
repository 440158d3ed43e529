use std::path::Path;

use crate::commands::common::{capture_editor_input_with_initial, open_session};
use crate::error::CliError;

pub async fn run_compose(site: &str, db_path: &Path) -> Result<(), CliError> {
    let session = open_session(site, db_path)?;
    let current = session.draft().content;

    let initial = if current.is_null() {
        empty_document()
    } else {
        serde_json::to_string_pretty(&current)?
    };

    let Some(edited) = capture_editor_input_with_initial(&initial)? else {
        println!("Content unchanged");
        return Ok(());
    };

    let content: serde_json::Value =
        serde_json::from_str(&edited).map_err(|error| CliError::InvalidContent(error.to_string()))?;

    if content == current {
        println!("Content unchanged");
        return Ok(());
    }

    session.set_content(content).await?;
    println!("{site}");
    Ok(())
}

/// Starting point for a site without content yet, in the block-document
/// shape the external editor produces.
fn empty_document() -> String {
    serde_json::to_string_pretty(&serde_json::json!({ "blocks": [] }))
        .unwrap_or_else(|_| "{\"blocks\": []}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_valid_json() {
        let parsed: serde_json::Value = serde_json::from_str(&empty_document()).unwrap();
        assert!(parsed["blocks"].is_array());
    }
}
