// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `stravach check-config`: what `serve` would refuse to start without.

use stravach_config::StravachConfig;

/// Outcome of a readiness check.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Report {
    /// Settings `serve` cannot start without.
    pub missing: Vec<&'static str>,
    /// Settings that degrade a feature when absent.
    pub warnings: Vec<String>,
}

impl Report {
    pub fn is_ready(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn print(&self) {
        for key in &self.missing {
            eprintln!("missing: {key}");
        }
        for warning in &self.warnings {
            eprintln!("warning: {warning}");
        }
        if self.is_ready() {
            println!("stravach: configuration OK");
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

/// `openai_key_in_env` reports whether `OPENAI_API_KEY` is set.
pub fn check(config: &StravachConfig, openai_key_in_env: bool) -> Report {
    let mut report = Report::default();

    if is_blank(&config.telegram.bot_token) {
        report.missing.push("telegram.bot_token");
    }
    if is_blank(&config.strava.client_id) {
        report.missing.push("strava.client_id");
    }
    if is_blank(&config.strava.client_secret) {
        report.missing.push("strava.client_secret");
    }
    if is_blank(&config.llm.api_key) && !openai_key_in_env {
        report.missing.push("llm.api_key (or OPENAI_API_KEY)");
    }

    if config.gateway.enabled {
        if is_blank(&config.strava.verify_token) {
            report.warnings.push(
                "strava.verify_token is not set, webhook subscriptions cannot be verified".into(),
            );
        }
        if config.gateway.public_url.contains("localhost") {
            report.warnings.push(format!(
                "gateway.public_url is {}, OAuth links will not work outside this machine",
                config.gateway.public_url
            ));
        }
    } else {
        report
            .warnings
            .push("gateway is disabled, only /refresh_activities will find new activities".into());
    }

    if config.telegram.allowed_users.is_empty() {
        report
            .warnings
            .push("telegram.allowed_users is empty, anyone can talk to the bot".into());
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> StravachConfig {
        let mut config = StravachConfig::default();
        config.telegram.bot_token = Some("123:abc".into());
        config.telegram.allowed_users = vec!["runner".into()];
        config.strava.client_id = Some("37166".into());
        config.strava.client_secret = Some("shh".into());
        config.strava.verify_token = Some("verify".into());
        config.llm.api_key = Some("sk-test".into());
        config.gateway.public_url = "https://bot.example.com".into();
        config
    }

    #[test]
    fn defaults_are_missing_every_secret() {
        let report = check(&StravachConfig::default(), false);
        assert_eq!(
            report.missing,
            vec![
                "telegram.bot_token",
                "strava.client_id",
                "strava.client_secret",
                "llm.api_key (or OPENAI_API_KEY)",
            ]
        );
        assert!(!report.is_ready());
    }

    #[test]
    fn complete_config_is_ready_without_warnings() {
        let report = check(&complete(), false);
        assert_eq!(report, Report::default());
    }

    #[test]
    fn openai_key_may_come_from_environment() {
        let mut config = complete();
        config.llm.api_key = None;
        assert!(check(&config, true).is_ready());
        assert!(!check(&config, false).is_ready());
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let mut config = complete();
        config.telegram.bot_token = Some("  ".into());
        assert_eq!(check(&config, false).missing, vec!["telegram.bot_token"]);
    }

    #[test]
    fn gateway_without_verify_token_warns() {
        let mut config = complete();
        config.strava.verify_token = None;
        let report = check(&config, false);
        assert!(report.is_ready());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("verify_token"));
    }
}
