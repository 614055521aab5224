// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for storage entities.

pub mod kv;
pub mod messages;
pub mod quota;
pub mod sessions;
pub mod usage;
