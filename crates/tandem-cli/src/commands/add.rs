use std::path::Path;

use tandem_core::{ContentKind, Note, SyncSettings, UpsertOutcome, WriteOrigin};

use crate::commands::common::{print_notices, resolve_note_content, Session};
use crate::error::CliError;

pub async fn run_add(
    content_parts: &[String],
    kind: &str,
    db_path: &Path,
    settings: SyncSettings,
) -> Result<(), CliError> {
    let kind = kind.parse::<ContentKind>().map_err(CliError::InvalidKind)?;
    let content = resolve_note_content(content_parts)?;

    let session = Session::open(db_path, settings).await?;
    let outcome = session
        .manager
        .upsert_note(Note::new(content, kind), WriteOrigin::Local)
        .await;
    let notices = session.finish().await;
    print_notices(&notices);

    match outcome? {
        UpsertOutcome::Persisted(summary) => println!("{}", summary.id),
        UpsertOutcome::Coalesced(id) => println!("{id}"),
    }
    Ok(())
}
