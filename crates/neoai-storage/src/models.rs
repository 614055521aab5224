// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for stored entities.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// A conversation owned by one caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub model: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One stored conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredMessage {
    pub id: String,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub model: Option<String>,
    pub tokens_used: Option<i64>,
    pub created_at: String,
}

/// One completed generation, keyed by the hashed caller id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    pub id: String,
    pub user_hash: String,
    pub model: String,
    pub tokens_in: i64,
    pub tokens_out: i64,
    pub created_at: String,
}

/// Current UTC time as an RFC 3339 string with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
