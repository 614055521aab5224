// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the neoai gateway.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level neoai configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NeoaiConfig {
    /// HTTP listener and request pipeline settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Identity broker (bearer assertion) settings.
    #[serde(default)]
    pub access: AccessConfig,

    /// Per-caller quota ceilings.
    #[serde(default)]
    pub quota: QuotaConfig,

    /// Google Gemini backend.
    #[serde(default)]
    pub gemini: ApiKeyBackendConfig,

    /// Groq backend.
    #[serde(default)]
    pub groq: ApiKeyBackendConfig,

    /// HuggingFace inference backend.
    #[serde(default)]
    pub huggingface: ApiKeyBackendConfig,

    /// Cloudflare Workers AI backend.
    #[serde(default)]
    pub workers_ai: WorkersAiConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl NeoaiConfig {
    pub fn is_development(&self) -> bool {
        self.server.environment == "development"
    }
}

/// HTTP server and chat pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `production` or `development`. Development without a team domain bypasses auth.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Maximum length of one chat message, in characters.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Number of prior messages replayed to the backend.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// System prompt prepended to every conversation.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            log_level: default_log_level(),
            environment: default_environment(),
            max_message_chars: default_max_message_chars(),
            history_limit: default_history_limit(),
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "production".to_string()
}

fn default_max_message_chars() -> usize {
    32_000
}

fn default_history_limit() -> u32 {
    50
}

fn default_system_prompt() -> String {
    "You are neoAI, a helpful, accurate, and concise AI assistant. \
     Respond in markdown when appropriate. Be direct and helpful."
        .to_string()
}

/// Identity broker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AccessConfig {
    /// Team name (`acme` for `acme.cloudflareaccess.com`) or a full https origin.
    #[serde(default)]
    pub team_domain: Option<String>,

    /// Audience tag every accepted assertion must carry.
    #[serde(default)]
    pub audience: Option<String>,

    /// Request header carrying the signed assertion.
    #[serde(default = "default_header_name")]
    pub header_name: String,

    /// Signing key cache freshness, in seconds.
    #[serde(default = "default_key_cache_ttl_secs")]
    pub key_cache_ttl_secs: u64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            team_domain: None,
            audience: None,
            header_name: default_header_name(),
            key_cache_ttl_secs: default_key_cache_ttl_secs(),
        }
    }
}

fn default_header_name() -> String {
    "CF-Access-JWT-Assertion".to_string()
}

fn default_key_cache_ttl_secs() -> u64 {
    600
}

/// Quota ceilings per caller.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaConfig {
    #[serde(default = "default_per_hour")]
    pub per_hour: u32,

    #[serde(default = "default_per_day")]
    pub per_day: u32,

    /// Upper bound on the daily stale-counter sweep, in milliseconds.
    #[serde(default = "default_cleanup_timeout_ms")]
    pub cleanup_timeout_ms: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            per_hour: default_per_hour(),
            per_day: default_per_day(),
            cleanup_timeout_ms: default_cleanup_timeout_ms(),
        }
    }
}

fn default_per_hour() -> u32 {
    50
}

fn default_per_day() -> u32 {
    500
}

fn default_cleanup_timeout_ms() -> u64 {
    5_000
}

/// Backend authenticated by a single API key.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiKeyBackendConfig {
    /// API key. `None` leaves the backend unavailable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Override for the upstream base URL.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Cloudflare Workers AI configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkersAiConfig {
    #[serde(default)]
    pub account_id: Option<String>,

    #[serde(default)]
    pub api_token: Option<String>,

    /// Override for the Cloudflare API base URL.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("neoai").join("neoai.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("neoai.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = NeoaiConfig::default();
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.server.max_message_chars, 32_000);
        assert_eq!(config.server.history_limit, 50);
        assert_eq!(config.quota.per_hour, 50);
        assert_eq!(config.quota.per_day, 500);
        assert_eq!(config.access.header_name, "CF-Access-JWT-Assertion");
        assert_eq!(config.access.key_cache_ttl_secs, 600);
        assert!(config.server.system_prompt.starts_with("You are neoAI"));
        assert!(!config.is_development());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let result: Result<NeoaiConfig, _> = toml::from_str("[quota]\nper_hour = 5\nper_week = 9\n");
        assert!(result.is_err());
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let config: NeoaiConfig = toml::from_str(
            r#"
[groq]
api_key = "gsk_test"

[workers_ai]
account_id = "abc"
"#,
        )
        .unwrap();
        assert_eq!(config.groq.api_key.as_deref(), Some("gsk_test"));
        assert!(config.groq.base_url.is_none());
        assert_eq!(config.workers_ai.account_id.as_deref(), Some("abc"));
        assert!(config.workers_ai.api_token.is_none());
        assert_eq!(config.quota.per_day, 500);
    }
}
