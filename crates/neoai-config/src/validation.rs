// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes.
//! Errors are collected rather than failing fast. Missing backend credentials
//! are not errors; they surface as warnings from [`collect_warnings`].

use crate::diagnostic::ConfigError;
use crate::model::NeoaiConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &NeoaiConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let addr = config.server.bind_address.trim();
    if addr.is_empty() {
        fail("server.bind_address must not be empty".to_string());
    } else {
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.bind_address `{addr}` is not a valid IP address or hostname"
            ));
        }
    }

    if !matches!(config.server.environment.as_str(), "production" | "development") {
        fail(format!(
            "server.environment must be `production` or `development`, got `{}`",
            config.server.environment
        ));
    }

    if config.server.max_message_chars == 0 {
        fail("server.max_message_chars must be at least 1".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.quota.per_hour == 0 {
        fail("quota.per_hour must be at least 1".to_string());
    }
    if config.quota.per_day == 0 {
        fail("quota.per_day must be at least 1".to_string());
    }
    if config.quota.per_hour > config.quota.per_day {
        fail(format!(
            "quota.per_hour ({}) must not exceed quota.per_day ({})",
            config.quota.per_hour, config.quota.per_day
        ));
    }

    if !config.is_development() {
        if is_blank(config.access.team_domain.as_deref()) {
            fail("access.team_domain is required outside development".to_string());
        }
        if is_blank(config.access.audience.as_deref()) {
            fail("access.audience is required outside development".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Non-fatal configuration issues, one line each.
pub fn collect_warnings(config: &NeoaiConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    if is_blank(config.gemini.api_key.as_deref()) {
        warnings.push("gemini.api_key not set: Gemini models disabled".to_string());
    }
    if is_blank(config.groq.api_key.as_deref()) {
        warnings.push("groq.api_key not set: Groq models disabled".to_string());
    }
    if is_blank(config.huggingface.api_key.as_deref()) {
        warnings.push("huggingface.api_key not set: HuggingFace models disabled".to_string());
    }
    if is_blank(config.workers_ai.account_id.as_deref())
        || is_blank(config.workers_ai.api_token.as_deref())
    {
        warnings.push(
            "workers_ai.account_id/api_token not set: Workers AI models disabled".to_string(),
        );
    }
    if config.is_development() && is_blank(config.access.team_domain.as_deref()) {
        warnings.push("development mode without access.team_domain: authentication bypassed".to_string());
    }
    warnings
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
