// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identifier helpers.

use sha2::{Digest, Sha256};

/// Generate a prefixed random identifier, e.g. `req_3f2a...`.
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4())
}

/// One-way hash of a caller id for usage records.
///
/// Hex of the first 16 bytes of SHA-256, so the raw id is never stored alongside usage.
pub fn hash_caller_id(caller_id: &str) -> String {
    let digest = Sha256::digest(caller_id.as_bytes());
    hex::encode(&digest[..16])
}
