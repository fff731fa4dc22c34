use std::path::Path;

use tandem_core::{ChangeEvent, SyncSettings};

use crate::commands::common::{print_notices, short_id, Session};
use crate::error::CliError;

pub async fn run_replay(
    events_path: &Path,
    db_path: &Path,
    settings: SyncSettings,
) -> Result<(), CliError> {
    let payload = std::fs::read_to_string(events_path)?;
    let events = parse_events(&payload)?;

    let session = Session::open(db_path, settings).await?;
    for event in events {
        let id = short_id(event.id);
        match session.manager.handle_event(event).await {
            Ok(resolution) => println!("{id:<13}  {}", resolution.label()),
            Err(error) => {
                println!("{id:<13}  failed");
                session.manager.notifier().report(&error);
            }
        }
    }
    let notices = session.finish().await;
    print_notices(&notices);
    Ok(())
}

pub fn parse_events(payload: &str) -> Result<Vec<ChangeEvent>, CliError> {
    Ok(serde_json::from_str(payload)?)
}
