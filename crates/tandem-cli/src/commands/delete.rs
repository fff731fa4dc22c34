use std::path::Path;

use tandem_core::SyncSettings;

use crate::commands::common::{print_notices, resolve_note, Session};
use crate::error::CliError;

pub async fn run_delete(id: &str, db_path: &Path, settings: SyncSettings) -> Result<(), CliError> {
    let session = Session::open(db_path, settings).await?;
    let note = resolve_note(id, &session.store).await?;

    let result = session.manager.delete_note(&note.id).await;
    let notices = session.finish().await;
    print_notices(&notices);

    result?;
    println!("{}", note.id);
    Ok(())
}
