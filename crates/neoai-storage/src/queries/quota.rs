// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-caller request counters keyed by time window.

use neoai_core::NeoaiError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Read the hourly and daily counters for a caller in one statement.
///
/// Missing rows count as zero.
pub async fn read_counters(
    db: &Database,
    user_id: &str,
    hour_key: &str,
    day_key: &str,
) -> Result<(u32, u32), NeoaiError> {
    let user_id = user_id.to_string();
    let hour_key = hour_key.to_string();
    let day_key = day_key.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT window, count FROM rate_limits
                 WHERE user_id = ?1 AND window IN (?2, ?3)",
            )?;
            let mut rows = stmt.query(params![user_id, hour_key, day_key])?;
            let (mut hourly, mut daily) = (0u32, 0u32);
            while let Some(row) = rows.next()? {
                let window: String = row.get(0)?;
                let count: u32 = row.get(1)?;
                if window == hour_key {
                    hourly = count;
                } else if window == day_key {
                    daily = count;
                }
            }
            Ok((hourly, daily))
        })
        .await
        .map_err(map_tr_err)
}

/// Increment (or create at 1) each listed window counter in one transaction.
pub async fn increment_counters(
    db: &Database,
    user_id: &str,
    windows: &[String],
) -> Result<(), NeoaiError> {
    let user_id = user_id.to_string();
    let windows = windows.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO rate_limits (user_id, window, count) VALUES (?1, ?2, 1)
                     ON CONFLICT (user_id, window) DO UPDATE SET count = count + 1",
                )?;
                for window in &windows {
                    stmt.execute(params![user_id, window])?;
                }
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

/// Delete hourly windows older than `hour_cutoff` and daily windows older than `day_cutoff`.
///
/// Cutoffs are full window keys (`h:...`, `d:...`); keys compare lexically.
pub async fn purge_stale(
    db: &Database,
    hour_cutoff: &str,
    day_cutoff: &str,
) -> Result<usize, NeoaiError> {
    let hour_cutoff = hour_cutoff.to_string();
    let day_cutoff = day_cutoff.to_string();
    db.connection()
        .call(move |conn| {
            let hourly = conn.execute(
                "DELETE FROM rate_limits WHERE window LIKE 'h:%' AND window < ?1",
                params![hour_cutoff],
            )?;
            let daily = conn.execute(
                "DELETE FROM rate_limits WHERE window LIKE 'd:%' AND window < ?1",
                params![day_cutoff],
            )?;
            Ok(hourly + daily)
        })
        .await
        .map_err(map_tr_err)
}
