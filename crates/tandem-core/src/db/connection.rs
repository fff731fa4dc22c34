//! Database connection management

use crate::error::Result;
use libsql::{Builder, Connection, Database as LibSqlDatabase};
use std::path::Path;

use super::migrations;

/// Database wrapper for local libSQL connections
pub struct Database {
    // Keeps the database handle alive for the connection's lifetime.
    _db: LibSqlDatabase,
    conn: Connection,
}

impl Database {
    /// Open a database at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let path_str = path.to_string_lossy().to_string();
        Self::build(&path_str).await
    }

    /// Open an in-memory database (useful for testing)
    pub async fn open_in_memory() -> Result<Self> {
        Self::build(":memory:").await
    }

    async fn build(path: &str) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        let database = Self { _db: db, conn };
        database.configure().await?;
        database.migrate().await?;
        tracing::debug!(path, "Database opened");
        Ok(database)
    }

    /// Configure `SQLite` for local use
    async fn configure(&self) -> Result<()> {
        // In-memory databases reject WAL; that's fine.
        self.conn
            .execute("PRAGMA journal_mode = WAL;", ())
            .await
            .ok();
        self.conn
            .execute("PRAGMA synchronous = NORMAL;", ())
            .await
            .ok();
        self.conn.execute("PRAGMA foreign_keys = ON;", ()).await?;
        Ok(())
    }

    async fn migrate(&self) -> Result<()> {
        migrations::run(&self.conn).await
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_open_in_memory() {
        let db = Database::open_in_memory().await.unwrap();
        let mut rows = db.connection().query("SELECT 1", ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i32>(0).unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_open_creates_parent_directories() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("nested").join("tandem.db");

        Database::open(&db_path).await.unwrap();
        assert!(db_path.exists());

        // Reopening runs migrations again without failing.
        Database::open(&db_path).await.unwrap();
    }
}
