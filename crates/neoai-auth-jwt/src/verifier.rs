// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access assertion verification with a process-wide key cache.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, decode_header};
use neoai_config::model::AccessConfig;
use neoai_core::{CallerIdentity, NeoaiError};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::jwks::{self, KeySet};

/// Claims read from a verified assertion.
#[derive(Debug, Deserialize)]
struct AccessClaims {
    sub: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
}

/// Verifies signed access assertions against the broker's published keys.
///
/// The key set is cached for `ttl` and swapped atomically on refresh, so
/// concurrent verifications always read one complete snapshot.
pub struct TokenVerifier {
    client: reqwest::Client,
    cache: ArcSwapOption<KeySet>,
    ttl: Duration,
}

impl TokenVerifier {
    pub fn new(client: reqwest::Client, ttl: Duration) -> Self {
        Self {
            client,
            cache: ArcSwapOption::empty(),
            ttl,
        }
    }

    pub fn from_config(client: reqwest::Client, config: &AccessConfig) -> Self {
        Self::new(client, Duration::from_secs(config.key_cache_ttl_secs))
    }

    /// Verify `token` and build the caller identity from its claims.
    ///
    /// An unknown key id forces at most one refresh. A cold or stale cache
    /// counts as that refresh.
    pub async fn verify(
        &self,
        token: &str,
        trust_domain: &str,
        audience: &str,
    ) -> Result<CallerIdentity, NeoaiError> {
        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "rejecting malformed access token");
            NeoaiError::unauthenticated("Invalid token format")
        })?;
        let kid = header
            .kid
            .ok_or_else(|| NeoaiError::unauthenticated("Token header has no key id"))?;

        let (mut keys, mut refreshed) = match self.cached(trust_domain) {
            Some(keys) => (keys, false),
            None => (self.refresh(trust_domain).await?, true),
        };
        if keys.get(&kid).is_none() && !refreshed {
            debug!(kid, "unknown signing key, refreshing key set");
            keys = self.refresh(trust_domain).await?;
            refreshed = true;
        }
        let Some(key) = keys.get(&kid) else {
            warn!(kid, refreshed, "no published key matches token");
            return Err(NeoaiError::unauthenticated("Unknown signing key"));
        };

        let data = decode::<AccessClaims>(token, key.decoding_key(), &key.validation(audience))
            .map_err(|e| {
                let reason = match e.kind() {
                    JwtErrorKind::ExpiredSignature => "Token expired",
                    JwtErrorKind::InvalidAudience => "Invalid audience",
                    JwtErrorKind::InvalidSignature => "Invalid token signature",
                    JwtErrorKind::InvalidAlgorithm => "Token algorithm does not match key",
                    JwtErrorKind::MissingRequiredClaim(_) => "Token is missing a required claim",
                    _ => "Authentication failed",
                };
                debug!(kid, error = %e, reason, "access token rejected");
                NeoaiError::unauthenticated(reason)
            })?;

        let claims = data.claims;
        Ok(CallerIdentity::new(claims.sub, claims.email, claims.name))
    }

    /// The cached key set if it is fresh and was fetched for `trust_domain`.
    fn cached(&self, trust_domain: &str) -> Option<Arc<KeySet>> {
        self.cache
            .load_full()
            .filter(|keys| keys.is_fresh_for(trust_domain, self.ttl))
    }

    async fn refresh(&self, trust_domain: &str) -> Result<Arc<KeySet>, NeoaiError> {
        let keys = Arc::new(jwks::fetch_key_set(&self.client, trust_domain).await?);
        self.cache.store(Some(Arc::clone(&keys)));
        Ok(keys)
    }
}
