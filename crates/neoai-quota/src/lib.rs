// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-caller request quotas for the neoai gateway.
//!
//! Callers are limited per UTC hour and per UTC day. Counters live in the
//! `rate_limits` table keyed by window (`h:YYYY-MM-DDTHH`, `d:YYYY-MM-DD`)
//! and stale windows are swept at most once a day.

pub mod tracker;
pub mod window;

pub use tracker::QuotaTracker;
