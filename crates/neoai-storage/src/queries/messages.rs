// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message persistence.

use neoai_core::{NeoaiError, Role, generate_id};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::{StoredMessage, now_timestamp};

/// The most recent `limit` messages of a session, oldest first.
pub async fn get_messages(
    db: &Database,
    session_id: &str,
    limit: u32,
) -> Result<Vec<StoredMessage>, NeoaiError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, role, content, model, tokens_used, created_at
                 FROM (
                     SELECT rowid AS seq, * FROM messages WHERE session_id = ?1
                     ORDER BY created_at DESC, rowid DESC LIMIT ?2
                 )
                 ORDER BY created_at ASC, seq ASC",
            )?;
            let rows = stmt.query_map(params![session_id, limit], |row| {
                Ok(StoredMessage {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    role: row.get(2)?,
                    content: row.get(3)?,
                    model: row.get(4)?,
                    tokens_used: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Append a message to a session and return the stored row.
pub async fn add_message(
    db: &Database,
    session_id: &str,
    role: Role,
    content: &str,
    model: Option<&str>,
    tokens_used: Option<i64>,
) -> Result<StoredMessage, NeoaiError> {
    let message = StoredMessage {
        id: generate_id("msg"),
        session_id: session_id.to_string(),
        role: role.to_string(),
        content: content.to_string(),
        model: model.map(str::to_string),
        tokens_used,
        created_at: now_timestamp(),
    };
    let row = message.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, session_id, role, content, model, tokens_used, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.id,
                    row.session_id,
                    row.role,
                    row.content,
                    row.model,
                    row.tokens_used,
                    row.created_at
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::sessions;

    #[tokio::test]
    async fn history_returns_latest_messages_in_order() {
        let db = Database::open_in_memory().await.unwrap();
        let session = sessions::create_session(&db, "alice", "m", None).await.unwrap();
        for i in 0..5 {
            add_message(&db, &session.id, Role::User, &format!("q{i}"), None, None)
                .await
                .unwrap();
        }

        let all = get_messages(&db, &session.id, 50).await.unwrap();
        let contents: Vec<_> = all.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q0", "q1", "q2", "q3", "q4"]);

        let recent = get_messages(&db, &session.id, 2).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q3", "q4"]);
    }

    #[tokio::test]
    async fn assistant_message_keeps_model_and_tokens() {
        let db = Database::open_in_memory().await.unwrap();
        let session = sessions::create_session(&db, "alice", "m", None).await.unwrap();
        let stored = add_message(
            &db,
            &session.id,
            Role::Assistant,
            "hello",
            Some("llama-3.1-8b-instant"),
            Some(5),
        )
        .await
        .unwrap();
        assert_eq!(stored.role, "assistant");

        let fetched = get_messages(&db, &session.id, 10).await.unwrap();
        assert_eq!(fetched, vec![stored]);
    }

    #[tokio::test]
    async fn deleting_session_cascades_to_messages() {
        let db = Database::open_in_memory().await.unwrap();
        let session = sessions::create_session(&db, "alice", "m", None).await.unwrap();
        add_message(&db, &session.id, Role::User, "hi", None, None)
            .await
            .unwrap();
        sessions::delete_session(&db, &session.id, "alice").await.unwrap();
        assert!(get_messages(&db, &session.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn message_for_unknown_session_is_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        let err = add_message(&db, "sess_missing", Role::User, "hi", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
