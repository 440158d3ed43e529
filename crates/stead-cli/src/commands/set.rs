use std::path::Path;

use crate::commands::common::open_session;
use crate::error::CliError;

pub async fn run_set_title(site: &str, title: &str, db_path: &Path) -> Result<(), CliError> {
    let session = open_session(site, db_path)?;
    session.set_title(title).await?;
    println!("{site}");
    Ok(())
}

pub async fn run_set_description(
    site: &str,
    description: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let session = open_session(site, db_path)?;
    session.set_description(description).await?;
    println!("{site}");
    Ok(())
}
