// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sensitive-content scanning and log redaction for the neoai gateway.

pub mod pii;
pub mod redact;

pub use pii::{Detection, PiiKind, ScanResult, scan};
pub use redact::{RedactingMakeWriter, RedactingWriter, mask_for_log};
