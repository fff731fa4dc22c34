//! Note store backed by libSQL

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libsql::{params, Connection, Row};
use tokio::sync::Mutex;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{ContentKind, Note, NoteId};
use crate::store::LocalStore;

const NOTE_COLUMNS: &str = "id, content, kind, title, date, is_locked, tokens";

/// `LocalStore` persisting notes in a libSQL database.
///
/// Cloning shares the same connection.
#[derive(Clone)]
pub struct LibSqlNoteStore {
    db: Arc<Mutex<Database>>,
}

impl LibSqlNoteStore {
    pub const fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    /// Open (or create) a store at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::open(path).await?;
        Ok(Self::new(Arc::new(Mutex::new(db))))
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self::new(Arc::new(Mutex::new(db))))
    }

    /// Number of stored notes
    pub async fn count(&self) -> Result<usize> {
        let db = self.db.lock().await;
        let mut rows = db
            .connection()
            .query("SELECT COUNT(*) FROM notes", ())
            .await?;
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        usize::try_from(count).map_err(|_| Error::Database(format!("invalid note count {count}")))
    }

    /// Ids starting with `prefix`, at most `limit` of them
    pub async fn find_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<NoteId>> {
        let pattern = format!("{}%", prefix.replace(['%', '_'], ""));
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let db = self.db.lock().await;
        let mut rows = db
            .connection()
            .query(
                "SELECT id FROM notes WHERE id LIKE ?1 ORDER BY id LIMIT ?2",
                params![pattern, limit],
            )
            .await?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            let id: String = row.get(0)?;
            ids.push(
                id.parse()
                    .map_err(|_| Error::Database(format!("invalid note id {id}")))?,
            );
        }
        Ok(ids)
    }

    async fn fetch(conn: &Connection, id: &NoteId) -> Result<Option<Note>> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1");
        let mut rows = conn.query(&sql, params![id.as_str()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(parse_note(&row)?)),
            None => Ok(None),
        }
    }
}

/// Parse a note from a database row
fn parse_note(row: &Row) -> Result<Note> {
    let id: String = row.get(0)?;
    let kind: String = row.get(2)?;
    let tokens: String = row.get(6)?;
    Ok(Note {
        id: id
            .parse()
            .map_err(|_| Error::Database(format!("invalid note id {id}")))?,
        content: row.get(1)?,
        kind: kind
            .parse::<ContentKind>()
            .map_err(|error| Error::Database(format!("invalid content kind {kind}: {error}")))?,
        title: row.get(3)?,
        date: row.get(4)?,
        is_locked: row.get::<i32>(5)? != 0,
        tokens: serde_json::from_str(&tokens)?,
    })
}

#[async_trait]
impl LocalStore for LibSqlNoteStore {
    async fn get_note(&self, id: &NoteId) -> Result<Option<Note>> {
        let db = self.db.lock().await;
        Self::fetch(db.connection(), id).await
    }

    async fn put_note(&self, note: &Note) -> Result<Note> {
        let db = self.db.lock().await;
        let conn = db.connection();
        conn.execute(
            "INSERT INTO notes (id, content, kind, title, date, is_locked, tokens)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                content = excluded.content,
                kind = excluded.kind,
                title = excluded.title,
                date = excluded.date,
                is_locked = excluded.is_locked,
                tokens = excluded.tokens",
            params![
                note.id.as_str(),
                note.content.clone(),
                note.kind.to_string(),
                note.title.clone(),
                note.date,
                i32::from(note.is_locked),
                serde_json::to_string(&note.tokens)?
            ],
        )
        .await?;

        Self::fetch(conn, &note.id)
            .await?
            .ok_or_else(|| Error::NotFound(note.id.to_string()))
    }

    async fn delete_note(&self, id: &NoteId) -> Result<()> {
        let db = self.db.lock().await;
        let rows = db
            .connection()
            .execute("DELETE FROM notes WHERE id = ?1", params![id.as_str()])
            .await?;
        if rows == 0 {
            tracing::debug!(%id, "Delete of missing note ignored");
        }
        Ok(())
    }

    async fn list_notes(&self, limit: usize, offset: usize) -> Result<Vec<Note>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes ORDER BY date DESC, id DESC LIMIT ?1 OFFSET ?2"
        );

        let db = self.db.lock().await;
        let mut rows = db.connection().query(&sql, params![limit, offset]).await?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next().await? {
            notes.push(parse_note(&row)?);
        }
        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_put_and_get_round_trips_all_fields() {
        let store = LibSqlNoteStore::open_in_memory().await.unwrap();
        let mut note = Note::new(
            "<h1>Trip</h1><p>pack boots</p>",
            ContentKind::semantic_html().with_param("version", "2"),
        );
        note.is_locked = true;

        let saved = store.put_note(&note).await.unwrap();
        assert_eq!(saved, note);
        assert_eq!(store.get_note(&note.id).await.unwrap(), Some(note));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_put_replaces_existing_note() {
        let store = LibSqlNoteStore::open_in_memory().await.unwrap();
        let mut note = Note::plain("first draft");
        store.put_note(&note).await.unwrap();

        note.content = "second draft".to_string();
        note.refresh_derived();
        store.put_note(&note).await.unwrap();

        let stored = store.get_note(&note.id).await.unwrap().unwrap();
        assert_eq!(stored.content, "second draft");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_is_idempotent() {
        let store = LibSqlNoteStore::open_in_memory().await.unwrap();
        let note = Note::plain("temporary");
        store.put_note(&note).await.unwrap();

        store.delete_note(&note.id).await.unwrap();
        store.delete_note(&note.id).await.unwrap();
        assert_eq!(store.get_note(&note.id).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_orders_by_date_with_paging() {
        let store = LibSqlNoteStore::open_in_memory().await.unwrap();
        for (content, date) in [("old", 1), ("newest", 3), ("middle", 2)] {
            let mut note = Note::plain(content);
            note.date = date;
            store.put_note(&note).await.unwrap();
        }

        let listed = store.list_notes(10, 0).await.unwrap();
        assert_eq!(
            listed.iter().map(|note| note.content.as_str()).collect::<Vec<_>>(),
            vec!["newest", "middle", "old"]
        );
        let page = store.list_notes(1, 1).await.unwrap();
        assert_eq!(page[0].content, "middle");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_find_ids_by_prefix() {
        let store = LibSqlNoteStore::open_in_memory().await.unwrap();
        let note = Note::plain("findable");
        store.put_note(&note).await.unwrap();

        let id = note.id.to_string();
        assert_eq!(
            store.find_ids_by_prefix(&id[..8], 3).await.unwrap(),
            vec![note.id]
        );
        assert!(store
            .find_ids_by_prefix("zzzz", 3)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_notes_survive_reopen() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("notes.db");
        let note = Note::plain("persisted");

        {
            let store = LibSqlNoteStore::open(&db_path).await.unwrap();
            store.put_note(&note).await.unwrap();
        }

        let store = LibSqlNoteStore::open(&db_path).await.unwrap();
        assert_eq!(store.get_note(&note.id).await.unwrap(), Some(note));
    }
}
