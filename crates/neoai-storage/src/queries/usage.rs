// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage tracking records.

use neoai_core::NeoaiError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::UsageRecord;

pub async fn record_usage(db: &Database, record: &UsageRecord) -> Result<(), NeoaiError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO usage_log (id, user_hash, model, tokens_in, tokens_out, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.user_hash,
                    record.model,
                    record.tokens_in,
                    record.tokens_out,
                    record.created_at
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Total output characters recorded for a hashed caller.
pub async fn total_tokens_out(db: &Database, user_hash: &str) -> Result<i64, NeoaiError> {
    let user_hash = user_hash.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COALESCE(SUM(tokens_out), 0) FROM usage_log WHERE user_hash = ?1",
                params![user_hash],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}
