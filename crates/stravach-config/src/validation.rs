// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::StravachConfig;

/// Telegram caps inline keyboards in practice; the codec also renders one digit.
const MAX_OPTIONS_LIMIT: usize = 9;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &StravachConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    if config.bot.queue_capacity == 0 {
        invalid("bot.queue_capacity must be at least 1".to_string());
    }

    if config.bot.step_timeout_secs == 0 {
        invalid("bot.step_timeout_secs must be at least 1".to_string());
    }

    if config.bot.max_options == 0 || config.bot.max_options > MAX_OPTIONS_LIMIT {
        invalid(format!(
            "bot.max_options must be between 1 and {MAX_OPTIONS_LIMIT}, got {}",
            config.bot.max_options
        ));
    }

    if config.gateway.max_inflight_webhooks == 0 {
        invalid("gateway.max_inflight_webhooks must be at least 1".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        invalid("storage.database_path must not be empty".to_string());
    }

    for (key, url) in [
        ("strava.api_base_url", &config.strava.api_base_url),
        ("strava.oauth_url", &config.strava.oauth_url),
        ("strava.token_url", &config.strava.token_url),
        ("llm.base_url", &config.llm.base_url),
        ("gateway.public_url", &config.gateway.public_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            invalid(format!("{key} must be an http(s) URL, got `{url}`"));
        }
    }

    if config.gateway.enabled && config.gateway.host.parse::<std::net::IpAddr>().is_err() {
        let host = &config.gateway.host;
        let is_valid_hostname = !host.is_empty()
            && host
                .chars()
                .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
        if !is_valid_hostname {
            invalid(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
