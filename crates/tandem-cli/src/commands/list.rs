use std::path::Path;

use tandem_core::store::LocalStore;

use crate::commands::common::{format_note_lines, note_to_list_item, open_store, NoteListItem};
use crate::error::CliError;

pub async fn run_list(limit: usize, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let notes = store.list_notes(limit, 0).await?;

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }

    Ok(())
}
