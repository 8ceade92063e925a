// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Name suggestions from an OpenAI-compatible chat completion service.
//!
//! [`OpenAiNamer`] implements [`NameSuggester`]: it builds a prompt from the
//! activity, asks the model for new-line separated names, and cleans the
//! answer into an ordered candidate list.

pub mod client;
pub mod types;

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use stravach_config::model::LlmConfig;
use stravach_core::traits::{NameSuggester, PluginAdapter};
use stravach_core::types::{AdapterType, HealthStatus, UserActivity};
use stravach_core::StravachError;
use tracing::{debug, info};

use crate::client::OpenAiClient;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that generates witty names for activities.";

/// Hard cap on candidates; the keyboard numbers options with single digits.
pub const MAX_SUGGESTIONS: usize = 9;

/// One leading list marker (`1.`, `2)`, `(3)`, `-`, `*` or `•`) followed by
/// whitespace or the end of the line. Digits that belong to the name stay.
static LEADING_ENUMERATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\(?\d+[.)]|[-*•])(?:\s+|$)").unwrap());

/// Name suggester backed by a chat completion model.
pub struct OpenAiNamer {
    client: OpenAiClient,
}

impl OpenAiNamer {
    /// API key resolution: `llm.api_key`, then `OPENAI_API_KEY`, else an error.
    pub fn new(config: &LlmConfig) -> Result<Self, StravachError> {
        let api_key = match &config.api_key {
            Some(key) => key.clone(),
            None => std::env::var("OPENAI_API_KEY").map_err(|_| {
                StravachError::Config(
                    "llm.api_key is not set and OPENAI_API_KEY is not in the environment".into(),
                )
            })?,
        };
        let client = OpenAiClient::new(
            &api_key,
            &config.base_url,
            config.model.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        info!(model = %config.model, "name suggester initialized");
        Ok(Self { client })
    }

    pub fn with_client(client: OpenAiClient) -> Self {
        Self { client }
    }

    async fn ask(&self, prompt: String) -> Result<Vec<String>, StravachError> {
        debug!(prompt = %prompt, "requesting name suggestions");
        let text = self.client.complete(SYSTEM_PROMPT, &prompt).await?;
        let names = parse_names(&text);
        if names.is_empty() {
            return Err(StravachError::GenerationFailed {
                message: "completion did not contain any names".into(),
            });
        }
        Ok(names)
    }
}

/// Prompt for a fresh batch of names.
pub fn suggestion_prompt(activity: &UserActivity, language: &str) -> String {
    format!(
        "Generate a several, new-line separated funny names for the following activity: {}, \
         of type {}, duration: {} seconds in {} language. This is for my Strava.",
        activity.name, activity.activity_type, activity.elapsed_time, language
    )
}

/// Prompt that steers the batch with the user's own words.
pub fn custom_prompt(activity: &UserActivity, language: &str, user_text: &str) -> String {
    format!(
        "Generate up to three, new-line separated names for the following activity: {}, of type {}. \
         Language: {}. I want this to be used in names: '{}'. If you think that what I suggested \
         can be a name - just return it. If it's a long message that contains something that looks \
         like a name - return it in formatted way (e.g. 'evening run' should be 'Evening Run'). \
         In any other way return just new names, nothing else should be included in the response",
        activity.name, activity.activity_type, language, user_text
    )
}

/// Split a completion into candidate names.
///
/// Strips list markers and wrapping quotes, drops blank lines and duplicates,
/// and keeps at most [`MAX_SUGGESTIONS`] entries in their original order.
pub fn parse_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for line in text.lines() {
        let stripped = LEADING_ENUMERATION.replace(line, "");
        let name = stripped
            .trim()
            .trim_matches(|c| c == '"' || c == '\'' || c == '*')
            .trim();
        if name.is_empty() || names.iter().any(|n| n == name) {
            continue;
        }
        names.push(name.to_string());
        if names.len() == MAX_SUGGESTIONS {
            break;
        }
    }
    names
}

#[async_trait]
impl PluginAdapter for OpenAiNamer {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Suggester
    }

    async fn health_check(&self) -> Result<HealthStatus, StravachError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), StravachError> {
        Ok(())
    }
}

#[async_trait]
impl NameSuggester for OpenAiNamer {
    async fn generate(
        &self,
        activity: &UserActivity,
        language: &str,
    ) -> Result<Vec<String>, StravachError> {
        self.ask(suggestion_prompt(activity, language)).await
    }

    async fn generate_with_prompt(
        &self,
        activity: &UserActivity,
        language: &str,
        prompt: &str,
    ) -> Result<Vec<String>, StravachError> {
        self.ask(custom_prompt(activity, language, prompt)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn jog() -> UserActivity {
        UserActivity {
            id: 42,
            user_id: 1,
            name: "Morning Jog".into(),
            distance: 5000.0,
            moving_time: 1500,
            elapsed_time: 1600,
            activity_type: "Run".into(),
            start_date: String::new(),
            average_heartrate: 0.0,
            average_speed: 0.0,
            renamed: false,
        }
    }

    fn namer(server: &MockServer) -> OpenAiNamer {
        OpenAiNamer::with_client(
            OpenAiClient::new("k", &server.uri(), "tiny", Duration::from_secs(5)).unwrap(),
        )
    }

    async fn respond_with(server: &MockServer, content: &str) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": content}}]
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn parse_strips_enumeration_and_quotes() {
        let text = "1. \"Sunrise Sprint\"\n2) Dawn Patrol\n\n- Jog Log\n";
        assert_eq!(
            parse_names(text),
            vec!["Sunrise Sprint", "Dawn Patrol", "Jog Log"]
        );
    }

    #[test]
    fn parse_keeps_names_starting_with_digits_or_parens() {
        let text = "1. 5K Fury\n2) 10 Miles of Smiles\n- (Half) Marathon Madness\n(4) 3 Peaks";
        assert_eq!(
            parse_names(text),
            vec!["5K Fury", "10 Miles of Smiles", "(Half) Marathon Madness", "3 Peaks"]
        );
    }

    #[test]
    fn unnumbered_names_are_left_alone() {
        assert_eq!(
            parse_names("10K Before Breakfast\n1.5 Hours of Glory"),
            vec!["10K Before Breakfast", "1.5 Hours of Glory"]
        );
    }

    #[test]
    fn parse_drops_duplicates_and_caps() {
        let text = (1..=15)
            .map(|i| format!("{i}. Name {}", i % 12))
            .collect::<Vec<_>>()
            .join("\n");
        let names = parse_names(&text);
        assert_eq!(names.len(), MAX_SUGGESTIONS);
        assert_eq!(names[0], "Name 1");
    }

    #[test]
    fn prompt_mentions_activity_details() {
        let prompt = suggestion_prompt(&jog(), "Polish");
        assert!(prompt.contains("Morning Jog"));
        assert!(prompt.contains("Run"));
        assert!(prompt.contains("1600 seconds"));
        assert!(prompt.contains("Polish"));
    }

    #[tokio::test]
    async fn generate_returns_clean_list() {
        let server = MockServer::start().await;
        respond_with(&server, "1. Sunrise Sprint\n2. Dawn Patrol").await;
        let names = namer(&server).generate(&jog(), "English").await.unwrap();
        assert_eq!(names, vec!["Sunrise Sprint", "Dawn Patrol"]);
    }

    #[tokio::test]
    async fn custom_prompt_is_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("evening run with Bob"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Evening Run With Bob"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let names = namer(&server)
            .generate_with_prompt(&jog(), "English", "evening run with Bob")
            .await
            .unwrap();
        assert_eq!(names, vec!["Evening Run With Bob"]);
    }

    #[tokio::test]
    async fn only_markers_is_generation_failure() {
        let server = MockServer::start().await;
        respond_with(&server, "1.\n2.\n-").await;
        let err = namer(&server).generate(&jog(), "English").await.unwrap_err();
        assert!(matches!(err, StravachError::GenerationFailed { .. }));
    }

    proptest! {
        #[test]
        fn parsed_names_are_never_blank(text in "[a-zA-Z0-9 .\\-\"\n]{0,200}") {
            let names = parse_names(&text);
            prop_assert!(names.len() <= MAX_SUGGESTIONS);
            for name in names {
                prop_assert!(!name.trim().is_empty());
                prop_assert_eq!(name.trim(), name.as_str());
            }
        }
    }
}
