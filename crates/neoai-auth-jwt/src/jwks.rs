// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signing key set retrieval and parsing.
//!
//! The broker publishes a JWK set at `/cdn-cgi/access/certs` under the team
//! domain. Only RSA signature keys with a key id are retained; anything else
//! in the document is skipped with a debug log.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use neoai_core::NeoaiError;
use serde::Deserialize;
use tracing::debug;

const CERTS_PATH: &str = "/cdn-cgi/access/certs";

/// Key set endpoint for a team domain.
///
/// A bare team name maps to `https://{team}.cloudflareaccess.com`; a value
/// that is already an http(s) origin is used as-is.
pub fn certs_url(team_domain: &str) -> String {
    let team_domain = team_domain.trim().trim_end_matches('/');
    if team_domain.starts_with("https://") || team_domain.starts_with("http://") {
        format!("{team_domain}{CERTS_PATH}")
    } else {
        format!("https://{team_domain}.cloudflareaccess.com{CERTS_PATH}")
    }
}

/// One verification key and the only algorithm it may be used with.
#[derive(Clone, Debug)]
pub struct SigningKey {
    decoding: DecodingKey,
    algorithm: Algorithm,
}

impl SigningKey {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }

    /// Validation pinned to this key's algorithm with zero clock leeway.
    pub(crate) fn validation(&self, audience: &str) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "aud", "sub"]);
        validation
    }
}

/// An immutable snapshot of the broker's keys. Replaced wholesale on refresh.
pub struct KeySet {
    trust_domain: String,
    keys: HashMap<String, SigningKey>,
    fetched_at: Instant,
}

impl fmt::Debug for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kids: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        kids.sort_unstable();
        f.debug_struct("KeySet")
            .field("trust_domain", &self.trust_domain)
            .field("keys", &kids)
            .field("fetched_at", &self.fetched_at)
            .finish()
    }
}

impl KeySet {
    pub fn new(trust_domain: impl Into<String>, keys: HashMap<String, SigningKey>) -> Self {
        Self {
            trust_domain: trust_domain.into(),
            keys,
            fetched_at: Instant::now(),
        }
    }

    pub fn get(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// True if this snapshot can still serve lookups for `trust_domain`.
    pub fn is_fresh_for(&self, trust_domain: &str, ttl: Duration) -> bool {
        self.trust_domain == trust_domain && self.fetched_at.elapsed() < ttl
    }
}

#[derive(Deserialize)]
struct KeySetDocument {
    #[serde(default)]
    keys: Vec<serde_json::Value>,
}

/// Parse a JWK set document into usable signing keys.
///
/// Entries that are not RSA signature keys, lack a `kid`, or fail to
/// deserialize are dropped individually.
pub fn parse_key_set(body: &[u8]) -> Result<HashMap<String, SigningKey>, NeoaiError> {
    let document: KeySetDocument = serde_json::from_slice(body)
        .map_err(|e| NeoaiError::unauthenticated(format!("malformed key set document: {e}")))?;

    let mut keys = HashMap::new();
    for raw in document.keys {
        let jwk: Jwk = match serde_json::from_value(raw) {
            Ok(jwk) => jwk,
            Err(e) => {
                debug!(error = %e, "skipping unparseable JWK");
                continue;
            }
        };
        let Some(kid) = jwk.common.key_id.clone() else {
            debug!("skipping JWK without kid");
            continue;
        };
        if matches!(
            jwk.common.public_key_use,
            Some(PublicKeyUse::Encryption | PublicKeyUse::Other(_))
        ) {
            debug!(kid, "skipping non-signature JWK");
            continue;
        }
        let AlgorithmParameters::RSA(rsa) = &jwk.algorithm else {
            debug!(kid, "skipping non-RSA JWK");
            continue;
        };
        let decoding = match DecodingKey::from_rsa_components(&rsa.n, &rsa.e) {
            Ok(decoding) => decoding,
            Err(e) => {
                debug!(kid, error = %e, "skipping JWK with invalid RSA components");
                continue;
            }
        };
        let algorithm = rsa_algorithm(jwk.common.key_algorithm);
        keys.insert(kid, SigningKey { decoding, algorithm });
    }
    Ok(keys)
}

/// The declared RSA algorithm, or RS256 when the key declares none.
fn rsa_algorithm(declared: Option<KeyAlgorithm>) -> Algorithm {
    match declared {
        Some(KeyAlgorithm::RS384) => Algorithm::RS384,
        Some(KeyAlgorithm::RS512) => Algorithm::RS512,
        Some(KeyAlgorithm::PS256) => Algorithm::PS256,
        Some(KeyAlgorithm::PS384) => Algorithm::PS384,
        Some(KeyAlgorithm::PS512) => Algorithm::PS512,
        _ => Algorithm::RS256,
    }
}

/// Fetch and parse the key set for `trust_domain`.
///
/// Every failure maps to `Unauthenticated`: an unreachable broker must never
/// let a request through.
pub async fn fetch_key_set(
    client: &reqwest::Client,
    trust_domain: &str,
) -> Result<KeySet, NeoaiError> {
    let url = certs_url(trust_domain);
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| NeoaiError::unauthenticated(format!("key set fetch failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(NeoaiError::unauthenticated(format!(
            "key set endpoint {url} returned {status}"
        )));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| NeoaiError::unauthenticated(format!("key set read failed: {e}")))?;
    let keys = parse_key_set(&body)?;
    debug!(url, keys = keys.len(), "fetched signing key set");
    Ok(KeySet::new(trust_domain, keys))
}
