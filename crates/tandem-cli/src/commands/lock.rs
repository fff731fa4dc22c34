use std::path::Path;

use tandem_core::{SyncSettings, WriteOrigin};

use crate::commands::common::{print_notices, resolve_note, Session};
use crate::error::CliError;

pub async fn run_set_locked(
    id: &str,
    locked: bool,
    db_path: &Path,
    settings: SyncSettings,
) -> Result<(), CliError> {
    let session = Session::open(db_path, settings).await?;
    let mut note = resolve_note(id, &session.store).await?;

    let result = if note.is_locked == locked {
        Ok(())
    } else {
        note.is_locked = locked;
        session
            .manager
            .upsert_note(note.clone(), WriteOrigin::Local)
            .await
            .map(|_| ())
    };
    let notices = session.finish().await;
    print_notices(&notices);

    result?;
    println!("{}", note.id);
    Ok(())
}
