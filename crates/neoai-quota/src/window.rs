// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Window keys and retry-after arithmetic.

use chrono::{DateTime, Duration, Timelike, Utc};

/// Hour bucket key, e.g. `h:2026-03-01T10`.
pub fn hour_key(at: DateTime<Utc>) -> String {
    at.format("h:%Y-%m-%dT%H").to_string()
}

/// Day bucket key, e.g. `d:2026-03-01`.
pub fn day_key(at: DateTime<Utc>) -> String {
    at.format("d:%Y-%m-%d").to_string()
}

/// Seconds until the top of the next hour, rounded up.
pub fn secs_until_next_hour(now: DateTime<Utc>) -> u64 {
    let elapsed = u64::from(now.minute()) * 60 + u64::from(now.second());
    3600 - elapsed
}

/// Seconds until the end of the current UTC day, rounded up, at least 1.
pub fn secs_until_end_of_day(now: DateTime<Utc>) -> u64 {
    let Some(midnight) = (now.date_naive() + Duration::days(1)).and_hms_opt(0, 0, 0) else {
        return 1;
    };
    let remaining_ms = (midnight.and_utc() - now).num_milliseconds().max(0) as u64;
    remaining_ms.div_ceil(1000).max(1)
}

/// Cutoff keys for the stale-counter sweep: hourly windows older than two
/// hours and daily windows older than two days.
pub fn purge_cutoffs(now: DateTime<Utc>) -> (String, String) {
    (
        hour_key(now - Duration::hours(2)),
        day_key(now - Duration::days(2)),
    )
}
