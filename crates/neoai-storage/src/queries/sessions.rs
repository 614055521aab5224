// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session CRUD operations. Every read and delete is scoped to the owning caller.

use neoai_core::{NeoaiError, generate_id};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};
use crate::models::{Session, now_timestamp};

/// Maximum sessions returned by [`list_sessions`].
const LIST_LIMIT: i64 = 50;

const DEFAULT_TITLE: &str = "New Chat";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        model: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Most recently updated sessions for a caller.
pub async fn list_sessions(db: &Database, user_id: &str) -> Result<Vec<Session>, NeoaiError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, model, created_at, updated_at
                 FROM sessions WHERE user_id = ?1
                 ORDER BY updated_at DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![user_id, LIST_LIMIT], session_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a session only if `user_id` owns it.
pub async fn get_session(
    db: &Database,
    id: &str,
    user_id: &str,
) -> Result<Option<Session>, NeoaiError> {
    let id = id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, user_id, title, model, created_at, updated_at
                 FROM sessions WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
                session_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Create a session for `user_id`. A missing or blank title becomes "New Chat".
pub async fn create_session(
    db: &Database,
    user_id: &str,
    model: &str,
    title: Option<&str>,
) -> Result<Session, NeoaiError> {
    let now = now_timestamp();
    let session = Session {
        id: generate_id("sess"),
        user_id: user_id.to_string(),
        title: title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string(),
        model: model.to_string(),
        created_at: now.clone(),
        updated_at: now,
    };
    let row = session.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_id, title, model, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.id,
                    row.user_id,
                    row.title,
                    row.model,
                    row.created_at,
                    row.updated_at
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    Ok(session)
}

pub async fn update_session_title(db: &Database, id: &str, title: &str) -> Result<(), NeoaiError> {
    let id = id.to_string();
    let title = title.to_string();
    let now = now_timestamp();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE sessions SET title = ?1, updated_at = ?2 WHERE id = ?3",
                params![title, now, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Bump `updated_at` so the session sorts first.
pub async fn touch_session(db: &Database, id: &str) -> Result<(), NeoaiError> {
    let id = id.to_string();
    let now = now_timestamp();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE sessions SET updated_at = ?1 WHERE id = ?2",
                params![now, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a caller's session and its messages. Returns false if nothing matched.
pub async fn delete_session(db: &Database, id: &str, user_id: &str) -> Result<bool, NeoaiError> {
    let id = id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM sessions WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Derive a session title from the first message.
pub fn generate_title(message: &str) -> String {
    let flattened = message.replace(['\r', '\n'], " ");
    let trimmed = flattened.trim();
    if trimmed.chars().count() > 60 {
        let head: String = trimmed.chars().take(57).collect();
        format!("{head}...")
    } else {
        trimmed.to_string()
    }
}
