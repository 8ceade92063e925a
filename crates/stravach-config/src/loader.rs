// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-based layered config loading.
//!
//! Lookup order: `./stravach.toml` > `~/.config/stravach/stravach.toml` >
//! `/etc/stravach/stravach.toml`, with `STRAVACH_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::StravachConfig;

/// Config sections that may be addressed through environment variables.
const ENV_SECTIONS: &[&str] = &["bot", "telegram", "strava", "llm", "storage", "gateway"];

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/stravach/stravach.toml`
/// 3. `~/.config/stravach/stravach.toml`
/// 4. `./stravach.toml`
/// 5. `STRAVACH_*` environment variables
pub fn load_config() -> Result<StravachConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<StravachConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StravachConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<StravachConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StravachConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used for the standard lookup, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(StravachConfig::default()))
        .merge(Toml::file("/etc/stravach/stravach.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("stravach/stravach.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("stravach.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// `Env::split("_")` would turn `STRAVACH_STRAVA_CLIENT_SECRET` into
/// `strava.client.secret`; only the first segment names the section.
fn env_provider() -> Env {
    Env::prefixed("STRAVACH_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env key to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
