// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value flags with TTL expiry.
//!
//! Expired entries are invisible to reads and are replaced on the next write.

use chrono::Utc;
use neoai_core::NeoaiError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Value for `key` unless it is absent or expired.
pub async fn kv_get(db: &Database, key: &str) -> Result<Option<String>, NeoaiError> {
    let key = key.to_string();
    let now = Utc::now().timestamp();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT value FROM kv_flags WHERE key = ?1 AND expires_at > ?2",
                params![key, now],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Set `key` unconditionally, expiring after `ttl_secs`.
pub async fn kv_put_with_ttl(
    db: &Database,
    key: &str,
    value: &str,
    ttl_secs: i64,
) -> Result<(), NeoaiError> {
    let key = key.to_string();
    let value = value.to_string();
    let expires_at = Utc::now().timestamp() + ttl_secs;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO kv_flags (key, value, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
                params![key, value, expires_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Claim `key` if no live entry holds it. Returns true when this call set it.
pub async fn kv_put_if_absent(
    db: &Database,
    key: &str,
    value: &str,
    ttl_secs: i64,
) -> Result<bool, NeoaiError> {
    let key = key.to_string();
    let value = value.to_string();
    let now = Utc::now().timestamp();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM kv_flags WHERE key = ?1 AND expires_at <= ?2",
                params![key, now],
            )?;
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO kv_flags (key, value, expires_at) VALUES (?1, ?2, ?3)",
                params![key, value, now + ttl_secs],
            )?;
            tx.commit()?;
            Ok(inserted == 1)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_and_get_round_trip() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(kv_get(&db, "cleanup:2026-03-01").await.unwrap().is_none());
        kv_put_with_ttl(&db, "cleanup:2026-03-01", "1", 60).await.unwrap();
        assert_eq!(
            kv_get(&db, "cleanup:2026-03-01").await.unwrap().as_deref(),
            Some("1")
        );
    }

    #[tokio::test]
    async fn expired_entries_are_invisible() {
        let db = Database::open_in_memory().await.unwrap();
        kv_put_with_ttl(&db, "k", "v", 0).await.unwrap();
        assert!(kv_get(&db, "k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_if_absent_claims_once() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(kv_put_if_absent(&db, "flag", "a", 60).await.unwrap());
        assert!(!kv_put_if_absent(&db, "flag", "b", 60).await.unwrap());
        assert_eq!(kv_get(&db, "flag").await.unwrap().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn put_if_absent_replaces_expired_entry() {
        let db = Database::open_in_memory().await.unwrap();
        kv_put_with_ttl(&db, "flag", "old", -1).await.unwrap();
        assert!(kv_put_if_absent(&db, "flag", "new", 60).await.unwrap());
        assert_eq!(kv_get(&db, "flag").await.unwrap().as_deref(), Some("new"));
    }
}
