use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tandem_core::models::ChangeOrigin;
use tandem_core::store::LocalStore;
use tandem_core::{ContentKind, Note, NoteId, SyncSettings};
use tempfile::{tempdir, TempDir};

use crate::cli::CompletionShell;
use crate::commands::add::run_add;
use crate::commands::common::{
    format_relative_time, load_settings, normalize_content, normalize_note_identifier,
    note_preview, open_store, resolve_note,
};
use crate::commands::completions::run_completions;
use crate::commands::delete::run_delete;
use crate::commands::lock::run_set_locked;
use crate::commands::merge::merge_texts;
use crate::commands::replay::{parse_events, run_replay};
use crate::error::CliError;

fn temp_db() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tandem.db");
    (dir, path)
}

fn settings() -> SyncSettings {
    SyncSettings {
        write_cooldown_ms: 0,
        ..SyncSettings::default()
    }
}

async fn seed(db_path: &Path, note: &Note) {
    open_store(db_path).await.unwrap().put_note(note).await.unwrap();
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
    assert!(matches!(
        normalize_note_identifier("  "),
        Err(CliError::EmptyNoteId)
    ));
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn note_preview_prefers_title_and_truncates() {
    let note = Note::new(
        "<h1>This is a very long heading that should be shortened</h1><p>body</p>",
        ContentKind::semantic_html(),
    );
    assert_eq!(note_preview(&note, 20), "This is a very lo...");
}

#[test]
fn cli_defaults_skip_the_write_cooldown() {
    let settings = load_settings(None).unwrap();
    assert_eq!(settings.write_cooldown_ms, 0);
}

#[test]
fn config_file_settings_are_loaded() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sync.json");
    std::fs::write(&path, r#"{ "default_max_content_chars": 42 }"#).unwrap();

    let settings = load_settings(Some(&path)).unwrap();
    assert_eq!(settings.default_max_content_chars, 42);

    std::fs::write(&path, r#"{ "unknown": true }"#).unwrap();
    assert!(load_settings(Some(&path)).is_err());
}

#[test]
fn merge_command_marks_both_sides() {
    let merged = merge_texts("foo<b>bold</b>end", "bar<i>italic</i>end", false).unwrap();
    assert_eq!(
        merged,
        "<del>foo<b>bold</b></del><ins>bar<i>italic</i></ins>end"
    );

    let lines = merge_texts("same\nmine", "same\ntheirs", true).unwrap();
    assert_eq!(lines, "same\n\nmine\n\n\ntheirs\n");
}

#[test]
fn completions_are_written_to_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tandem.bash");
    run_completions(CompletionShell::Bash, Some(&path)).unwrap();
    assert!(std::fs::read_to_string(&path).unwrap().contains("tandem"));
}

#[test]
fn events_parse_with_defaults() {
    let id = NoteId::new();
    let payload = format!(
        r#"[{{ "origin": "conflict", "id": "{id}", "old_value": {{ "id": "{id}", "content": "mine", "date": 1 }} }}]"#
    );
    let events = parse_events(&payload).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].origin, ChangeOrigin::Conflict);
    assert_eq!(events[0].new_value, None);
    assert_eq!(
        events[0].old_value.as_ref().map(|note| note.kind.clone()),
        Some(ContentKind::plain())
    );
}

#[tokio::test(flavor = "current_thread")]
async fn add_persists_note_with_kind() {
    let (_dir, db_path) = temp_db();
    run_add(
        &["<p>hello</p>".to_string()],
        "semantic-html;version=2",
        &db_path,
        settings(),
    )
    .await
    .unwrap();

    let notes = open_store(&db_path).await.unwrap().list_notes(10, 0).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "hello");
    assert_eq!(notes[0].kind.to_string(), "semantic-html;version=2");
}

#[tokio::test(flavor = "current_thread")]
async fn add_rejects_invalid_kind() {
    let (_dir, db_path) = temp_db();
    let error = run_add(&["x".to_string()], ";", &db_path, settings())
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::InvalidKind(_)));
}

#[tokio::test(flavor = "current_thread")]
async fn resolve_note_accepts_unique_prefix() {
    let (_dir, db_path) = temp_db();
    let note = Note::plain("prefix lookup");
    seed(&db_path, &note).await;

    let store = open_store(&db_path).await.unwrap();
    let id = note.id.to_string();
    assert_eq!(resolve_note(&id, &store).await.unwrap(), note);
    assert_eq!(resolve_note(&id[..10], &store).await.unwrap(), note);
    assert!(matches!(
        resolve_note("ffffffff", &store).await,
        Err(CliError::NoteNotFound(_))
    ));
}

#[tokio::test(flavor = "current_thread")]
async fn locked_note_refuses_delete_until_unlocked() {
    let (_dir, db_path) = temp_db();
    let note = Note::plain("precious");
    seed(&db_path, &note).await;
    let id = note.id.to_string();

    run_set_locked(&id, true, &db_path, settings()).await.unwrap();
    let error = run_delete(&id, &db_path, settings()).await.unwrap_err();
    assert_eq!(
        error.user_message(),
        "Unlock the note first before deleting it."
    );

    run_set_locked(&id, false, &db_path, settings()).await.unwrap();
    run_delete(&id, &db_path, settings()).await.unwrap();
    let store = open_store(&db_path).await.unwrap();
    assert_eq!(store.get_note(&note.id).await.unwrap(), None);
}

#[tokio::test(flavor = "current_thread")]
async fn replay_applies_remote_and_conflict_events() {
    let (dir, db_path) = temp_db();
    let mut local = Note::plain("shared\nmine");
    local.date = 10;
    seed(&db_path, &local).await;

    let pushed = NoteId::new();
    let id = local.id;
    let events = format!(
        r#"[
            {{ "origin": "remote", "id": "{pushed}",
               "new_value": {{ "id": "{pushed}", "content": "from phone", "date": 5 }} }},
            {{ "origin": "conflict", "id": "{id}",
               "old_value": {{ "id": "{id}", "content": "shared\nmine", "date": 10 }},
               "new_value": {{ "id": "{id}", "content": "shared\ntheirs", "date": 20 }} }}
        ]"#
    );
    let events_path = dir.path().join("events.json");
    std::fs::write(&events_path, events).unwrap();

    run_replay(&events_path, &db_path, settings()).await.unwrap();

    let store = open_store(&db_path).await.unwrap();
    let applied = store.get_note(&pushed).await.unwrap().unwrap();
    assert_eq!(applied.title, "from phone");
    let merged = store.get_note(&local.id).await.unwrap().unwrap();
    assert_eq!(merged.content, "shared\n\nmine\n\n\ntheirs\n");
    assert_eq!(merged.date, 20);
}
