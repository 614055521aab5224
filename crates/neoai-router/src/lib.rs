// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend registry for the neoai gateway.
//!
//! [`BackendRegistry`] holds every configured backend adapter, indexes their
//! model catalogs, and routes a chat request to the adapter that owns the
//! requested model.

pub mod registry;

pub use registry::BackendRegistry;
