// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for neoai.
//!
//! Serves the `/api` surface: access-assertion authentication, the streaming
//! chat pipeline with its stream tee and reply accumulator, session
//! management, and the model catalog.

pub mod auth;
pub mod chat;
pub mod error;
pub mod fanout;
pub mod handlers;
pub mod persistence;
pub mod request_log;
pub mod server;

#[cfg(test)]
mod testing;

pub use error::ApiError;
pub use server::{GatewayState, bind, router, serve};
