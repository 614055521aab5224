// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quota tracking with hourly and daily ceilings.
//!
//! Both windows are read in one round trip before anything is written. A
//! caller at or over either ceiling is rejected with the seconds remaining in
//! that window. Admitted requests increment both counters in the background.
//!
//! The check-then-increment sequence is not atomic, so concurrent requests
//! from one caller can overshoot a ceiling slightly. If the counter store is
//! unreachable the request is admitted.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use neoai_config::model::QuotaConfig;
use neoai_core::{BackgroundTasks, NeoaiError};
use neoai_storage::Database;
use neoai_storage::queries::{kv, quota};
use tracing::{debug, error, info, warn};

use crate::window;

/// Lifetime of the durable once-per-day cleanup flag.
const CLEANUP_FLAG_TTL_SECS: i64 = 86_400;

/// Per-caller request quota enforcement.
pub struct QuotaTracker {
    db: Database,
    tasks: BackgroundTasks,
    per_hour: u32,
    per_day: u32,
    cleanup_timeout: Duration,
    /// Last UTC day this process attempted a sweep.
    last_cleanup: Mutex<Option<NaiveDate>>,
}

impl QuotaTracker {
    pub fn new(db: Database, tasks: BackgroundTasks, config: &QuotaConfig) -> Self {
        Self {
            db,
            tasks,
            per_hour: config.per_hour,
            per_day: config.per_day,
            cleanup_timeout: Duration::from_millis(config.cleanup_timeout_ms),
            last_cleanup: Mutex::new(None),
        }
    }

    /// Admit or reject one request from `caller_id`.
    pub async fn check_and_increment(&self, caller_id: &str) -> Result<(), NeoaiError> {
        self.check_and_increment_at(caller_id, Utc::now()).await
    }

    /// [`check_and_increment`](Self::check_and_increment) evaluated at `now`.
    pub async fn check_and_increment_at(
        &self,
        caller_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), NeoaiError> {
        self.maybe_cleanup(now);

        let hour_key = window::hour_key(now);
        let day_key = window::day_key(now);

        let (hourly, daily) =
            match quota::read_counters(&self.db, caller_id, &hour_key, &day_key).await {
                Ok(counts) => counts,
                Err(e) => {
                    error!(
                        error_id = e.error_id(),
                        error = %e,
                        "quota store unavailable, admitting request"
                    );
                    return Ok(());
                }
            };

        if hourly >= self.per_hour {
            let retry_after = window::secs_until_next_hour(now);
            warn!(hourly, limit = self.per_hour, retry_after, "hourly quota exhausted");
            return Err(NeoaiError::rate_limited(retry_after));
        }
        if daily >= self.per_day {
            let retry_after = window::secs_until_end_of_day(now);
            warn!(daily, limit = self.per_day, retry_after, "daily quota exhausted");
            return Err(NeoaiError::rate_limited(retry_after));
        }

        let db = self.db.clone();
        let caller_id = caller_id.to_string();
        self.tasks.spawn("quota_increment", async move {
            quota::increment_counters(&db, &caller_id, &[hour_key, day_key]).await
        });

        Ok(())
    }

    /// Trigger the stale-counter sweep at most once per UTC day per process.
    ///
    /// A durable flag keeps other instances sharing the store from sweeping the
    /// same day. The sweep is time-boxed and its failures are only logged.
    fn maybe_cleanup(&self, now: DateTime<Utc>) {
        let today = now.date_naive();
        {
            let Ok(mut last) = self.last_cleanup.lock() else {
                return;
            };
            if *last == Some(today) {
                return;
            }
            *last = Some(today);
        }

        let db = self.db.clone();
        let timeout = self.cleanup_timeout;
        self.tasks.spawn("quota_cleanup", async move {
            match tokio::time::timeout(timeout, sweep(&db, now)).await {
                Ok(Ok(Some(removed))) => info!(removed, "purged stale quota counters"),
                Ok(Ok(None)) => debug!("quota cleanup already claimed for today"),
                Ok(Err(e)) => debug!(error = %e, "quota cleanup failed"),
                Err(_) => debug!(?timeout, "quota cleanup timed out"),
            }
            Ok(())
        });
    }
}

/// Claim today's cleanup flag and purge. `None` when another instance holds the flag.
async fn sweep(db: &Database, now: DateTime<Utc>) -> Result<Option<usize>, NeoaiError> {
    let flag = format!("cleanup:{}", now.format("%Y-%m-%d"));
    if !kv::kv_put_if_absent(db, &flag, "1", CLEANUP_FLAG_TTL_SECS).await? {
        return Ok(None);
    }
    let (hour_cutoff, day_cutoff) = window::purge_cutoffs(now);
    let removed = quota::purge_stale(db, &hour_cutoff, &day_cutoff).await?;
    Ok(Some(removed))
}
