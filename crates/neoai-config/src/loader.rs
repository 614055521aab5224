// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./neoai.toml` > `~/.config/neoai/neoai.toml` > `/etc/neoai/neoai.toml`
//! with environment variable overrides via `NEOAI_` prefix.

#![allow(clippy::result_large_err)]

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::NeoaiConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/neoai/neoai.toml` (system-wide)
/// 3. `~/.config/neoai/neoai.toml` (user XDG config)
/// 4. `./neoai.toml` (local directory)
/// 5. `NEOAI_*` environment variables
pub fn load_config() -> Result<NeoaiConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<NeoaiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NeoaiConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<NeoaiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NeoaiConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(NeoaiConfig::default()))
        .merge(Toml::file("/etc/neoai/neoai.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("neoai/neoai.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("neoai.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Keys arrive upper-cased (`ACCESS_TEAM_DOMAIN`) and are lower-cased before
/// matching section prefixes. Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `NEOAI_WORKERS_AI_API_TOKEN` must map to `workers_ai.api_token`,
/// not `workers.ai.api.token`.
fn env_provider() -> Env {
    Env::prefixed("NEOAI_").map(|key| {
        let key_str = key.as_str().to_ascii_lowercase();
        let mapped = [
            "workers_ai_",
            "huggingface_",
            "gemini_",
            "groq_",
            "server_",
            "access_",
            "quota_",
            "storage_",
        ]
        .iter()
        .find_map(|section| {
            key_str.strip_prefix(section).map(|rest| {
                format!("{}.{rest}", section.trim_end_matches('_'))
            })
        })
        .unwrap_or(key_str);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_overrides_defaults() {
        let config = load_config_from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address, "127.0.0.1");
    }

    #[test]
    fn env_vars_map_onto_sections() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("neoai.toml", "[quota]\nper_hour = 10\n")?;
            jail.set_env("NEOAI_QUOTA_PER_DAY", "99");
            jail.set_env("NEOAI_WORKERS_AI_API_TOKEN", "cf-token");
            jail.set_env("NEOAI_ACCESS_TEAM_DOMAIN", "acme");

            let config = load_config_from_path(Path::new("neoai.toml"))?;
            assert_eq!(config.quota.per_hour, 10);
            assert_eq!(config.quota.per_day, 99);
            assert_eq!(config.workers_ai.api_token.as_deref(), Some("cf-token"));
            assert_eq!(config.access.team_domain.as_deref(), Some("acme"));
            Ok(())
        });
    }

    #[test]
    fn backend_key_from_env_loads_without_file() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("NEOAI_GROQ_API_KEY", "gsk-test");
            jail.set_env("NEOAI_SERVER_ENVIRONMENT", "development");

            let config: NeoaiConfig = build_figment().extract()?;
            assert_eq!(config.groq.api_key.as_deref(), Some("gsk-test"));
            assert!(config.is_development());
            Ok(())
        });
    }

    #[test]
    fn unknown_section_key_is_an_error() {
        let err = load_config_from_str("[server]\nprot = 9000\n").unwrap_err();
        assert!(err.to_string().contains("prot"));
    }
}
