// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence of a finished assistant reply.

use neoai_core::{NeoaiError, Role, generate_id, hash_caller_id};
use neoai_storage::queries::{messages, sessions, usage};
use neoai_storage::{Database, UsageRecord, now_timestamp};
use tracing::{debug, error};

use crate::fanout::Completed;

/// Where a reply belongs.
#[derive(Debug, Clone)]
pub struct ReplyTarget {
    pub db: Database,
    pub session_id: String,
    pub caller_id: String,
    pub model: String,
}

/// Store the reply, bump the session, and record usage.
///
/// Each step logs its own failure and the rest still run. Always `Ok`.
pub async fn persist_reply(target: ReplyTarget, completed: Completed) -> Result<(), NeoaiError> {
    let chars = completed.text.chars().count() as i64;

    if !completed.text.is_empty()
        && let Err(e) = messages::add_message(
            &target.db,
            &target.session_id,
            Role::Assistant,
            &completed.text,
            Some(&target.model),
            Some(chars),
        )
        .await
    {
        error!(
            session_id = %target.session_id,
            error_id = e.error_id(),
            error = %e,
            "failed to store assistant reply"
        );
    }

    if let Err(e) = sessions::touch_session(&target.db, &target.session_id).await {
        error!(
            session_id = %target.session_id,
            error_id = e.error_id(),
            error = %e,
            "failed to update session timestamp"
        );
    }

    let record = UsageRecord {
        id: generate_id("usage"),
        user_hash: hash_caller_id(&target.caller_id),
        model: target.model.clone(),
        tokens_in: 0,
        tokens_out: chars,
        created_at: now_timestamp(),
    };
    if let Err(e) = usage::record_usage(&target.db, &record).await {
        error!(
            model = %target.model,
            error_id = e.error_id(),
            error = %e,
            "failed to record usage"
        );
    }

    debug!(
        session_id = %target.session_id,
        chars,
        client_connected = completed.client_connected,
        truncated = completed.error.is_some(),
        "reply persisted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (Database, String) {
        let db = Database::open_in_memory().await.unwrap();
        let session = sessions::create_session(&db, "user-1", "m1", Some("t"))
            .await
            .unwrap();
        (db, session.id)
    }

    fn completed(text: &str) -> Completed {
        Completed {
            text: text.to_string(),
            error: None,
            client_connected: true,
        }
    }

    #[tokio::test]
    async fn stores_reply_and_hashed_usage() {
        let (db, session_id) = setup().await;
        let target = ReplyTarget {
            db: db.clone(),
            session_id: session_id.clone(),
            caller_id: "user-1".into(),
            model: "m1".into(),
        };
        persist_reply(target, completed("héllo")).await.unwrap();

        let stored = messages::get_messages(&db, &session_id, 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].role, "assistant");
        assert_eq!(stored[0].content, "héllo");
        assert_eq!(stored[0].tokens_used, Some(5));
        assert_eq!(stored[0].model.as_deref(), Some("m1"));

        let total = usage::total_tokens_out(&db, &hash_caller_id("user-1"))
            .await
            .unwrap();
        assert_eq!(total, 5);
        assert_eq!(usage::total_tokens_out(&db, "user-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_reply_stores_no_message() {
        let (db, session_id) = setup().await;
        let target = ReplyTarget {
            db: db.clone(),
            session_id: session_id.clone(),
            caller_id: "user-1".into(),
            model: "m1".into(),
        };
        persist_reply(target, completed("")).await.unwrap();
        assert!(messages::get_messages(&db, &session_id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_message_insert_still_records_usage() {
        let db = Database::open_in_memory().await.unwrap();
        // No such session: the message insert violates the foreign key.
        let target = ReplyTarget {
            db: db.clone(),
            session_id: "sess_missing".into(),
            caller_id: "user-1".into(),
            model: "m1".into(),
        };
        persist_reply(target, completed("lost reply")).await.unwrap();
        let total = usage::total_tokens_out(&db, &hash_caller_id("user-1"))
            .await
            .unwrap();
        assert_eq!(total, 10);
    }
}
