use std::path::Path;

use crate::commands::common::{open_store, resolve_note};
use crate::error::CliError;

pub async fn run_show(id: &str, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let note = resolve_note(id, &store).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("{}", note.content);
    }
    Ok(())
}
