// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for neoai.
//!
//! Provides [`MockBackend`], a scripted [`BackendAdapter`](neoai_core::BackendAdapter)
//! used by registry and gateway pipeline tests.

pub mod mock_backend;

pub use mock_backend::{MockBackend, mock_model};
