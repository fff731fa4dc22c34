use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tandem_core::store::{LocalStore, MemoryRemote};
use tandem_core::sync::NoticeReceiver;
use tandem_core::{LibSqlNoteStore, Note, NoteId, Notice, SyncManager, SyncSettings};

use crate::error::CliError;

/// One-shot commands issue a single write per note, so nothing coalesces.
const CLI_WRITE_COOLDOWN_MS: u64 = 0;

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub kind: String,
    pub date: i64,
    pub relative_time: String,
    pub is_locked: bool,
}

/// A sync manager over the local database with an offline remote.
pub struct Session {
    pub manager: SyncManager,
    pub store: LibSqlNoteStore,
    notices: NoticeReceiver,
}

impl Session {
    pub async fn open(db_path: &Path, settings: SyncSettings) -> Result<Self, CliError> {
        let store = open_store(db_path).await?;
        let (manager, notices) = SyncManager::new(
            Arc::new(store.clone()),
            Arc::new(MemoryRemote::new()),
            settings,
        );
        Ok(Self {
            manager,
            store,
            notices,
        })
    }

    /// Wait for queued writes and collect the notices raised meanwhile.
    pub async fn finish(mut self) -> Vec<Notice> {
        self.manager.shutdown().await;
        let mut notices = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            notices.push(notice);
        }
        notices
    }
}

pub async fn open_store(db_path: &Path) -> Result<LibSqlNoteStore, CliError> {
    Ok(LibSqlNoteStore::open(db_path).await?)
}

/// Defaults, then the optional JSON file, then `TANDEM_*` variables.
pub fn load_settings(config_path: Option<&Path>) -> Result<SyncSettings, CliError> {
    let settings = match config_path {
        Some(path) => {
            let payload = std::fs::read_to_string(path)?;
            SyncSettings::from_json_str(&payload)?
        }
        None => SyncSettings {
            write_cooldown_ms: CLI_WRITE_COOLDOWN_MS,
            ..SyncSettings::default()
        },
    };
    Ok(settings.with_env_overrides()?)
}

pub async fn resolve_note(note_query: &str, store: &LibSqlNoteStore) -> Result<Note, CliError> {
    let note_query = normalize_note_identifier(note_query)?;
    if let Ok(note_id) = note_query.parse::<NoteId>() {
        if let Some(note) = store.get_note(&note_id).await? {
            return Ok(note);
        }
    }

    let matching_ids = store.find_ids_by_prefix(&note_query, 3).await?;
    match matching_ids.as_slice() {
        [] => Err(CliError::NoteNotFound(note_query)),
        [id] => store
            .get_note(id)
            .await?
            .ok_or(CliError::NoteNotFound(note_query)),
        ids => {
            let options = ids
                .iter()
                .map(|id| short_id(*id))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{note_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: NoteId) -> String {
    id.to_string().chars().take(13).collect()
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|note| {
            let preview = note_preview(note, 40);
            let relative_time = format_relative_time(note.date, now_ms);
            let lock = if note.is_locked { "locked" } else { "" };
            format!(
                "{:<13}  {preview:<40}  {relative_time:<10}  {lock}",
                short_id(note.id)
            )
            .trim_end()
            .to_string()
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    NoteListItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        preview: note_preview(note, 80),
        kind: note.kind.to_string(),
        date: note.date,
        relative_time: format_relative_time(note.date, now_ms),
        is_locked: note.is_locked,
    }
}

/// Derived title, or the first content line for notes without one
pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let source = if note.title.is_empty() {
        note.content.lines().next().unwrap_or("").trim()
    } else {
        note.title.as_str()
    };
    let collapsed = source.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_notice(notice: &Notice) -> String {
    notice.to_string()
}

pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        eprintln!("{}", format_notice(notice));
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn resolve_note_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("TANDEM_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(env::temp_dir)
        .join("tandem")
        .join("tandem.db")
}
