// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and migrations.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Query modules accept `&Database` and go through `connection().call()`.

use std::path::Path;

use neoai_core::NeoaiError;
use tracing::{debug, info};

use crate::migrations;

/// Handle to the SQLite store. Cheap to clone; clones share one connection thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (creating if needed) the database at `path` and run pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, NeoaiError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(NeoaiError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(NeoaiError::storage)?;
        let db = Self { conn };
        db.apply_pragmas(wal_mode).await?;
        db.migrate().await?;
        info!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database with the full schema applied.
    pub async fn open_in_memory() -> Result<Self, NeoaiError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(NeoaiError::storage)?;
        let db = Self { conn };
        db.apply_pragmas(false).await?;
        db.migrate().await?;
        Ok(db)
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Round-trip a trivial statement. Used by health reporting.
    pub async fn ping(&self) -> Result<(), NeoaiError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("SELECT 1", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint the WAL. The connection thread exits when the last clone drops.
    pub async fn close(self) -> Result<(), NeoaiError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("database checkpointed");
        Ok(())
    }

    async fn apply_pragmas(&self, wal_mode: bool) -> Result<(), NeoaiError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal_mode {
                    conn.pragma_update(None, "journal_mode", "WAL")?;
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                }
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.pragma_update(None, "busy_timeout", 5000)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn migrate(&self) -> Result<(), NeoaiError> {
        self.conn
            .call(|conn| Ok::<_, rusqlite::Error>(migrations::run_migrations(conn)))
            .await
            .map_err(map_tr_err)?
    }
}

/// Map a tokio-rusqlite failure into the storage error class.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> NeoaiError {
    NeoaiError::storage(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_database_has_schema() {
        let db = Database::open_in_memory().await.unwrap();
        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt =
                    conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        for expected in ["kv_flags", "messages", "rate_limits", "sessions", "usage_log"] {
            assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
        }
        db.ping().await.unwrap();
    }

    #[tokio::test]
    async fn file_database_creates_parent_dirs_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/neoai.db");
        let path = path.to_str().unwrap().to_string();

        let db = Database::open(&path, true).await.unwrap();
        db.close().await.unwrap();

        // Migrations are idempotent across reopen.
        let db = Database::open(&path, true).await.unwrap();
        db.ping().await.unwrap();
    }
}
