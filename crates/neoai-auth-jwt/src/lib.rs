// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access assertion verification for neoai.
//!
//! Requests carry a signed assertion issued by the identity broker. The
//! [`TokenVerifier`] checks it against the broker's rotating RSA key set and
//! returns the [`CallerIdentity`](neoai_core::CallerIdentity) it describes.

pub mod jwks;
pub mod verifier;

pub use jwks::{KeySet, SigningKey, certs_url};
pub use verifier::TokenVerifier;
