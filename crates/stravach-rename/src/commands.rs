// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash commands understood by the bot.

use stravach_core::error::StravachError;
use stravach_core::types::{ChatId, User, UserActivity};
use tracing::{debug, error, info};

use crate::{RenameEngine, bounded, naming, render};

const SET_LANGUAGE_USAGE: &str = "Usage: /set_language <Language>, e.g. /set_language Ukrainian";
const TEST_PROMPT_USAGE: &str = "Usage: /test_prompt <type> <prompt>";
const GENERIC_FAILURE: &str = "Something went wrong, please try again later.";

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    RefreshActivities,
    /// `None` when the argument count is wrong.
    SetLanguage(Option<String>),
    /// `None` when the type or prompt is missing.
    TestPrompt(Option<TestPrompt>),
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPrompt {
    pub activity_type: String,
    pub prompt: String,
}

/// Parse a message as a command. Text not starting with `/` is not a command.
///
/// A `@botname` suffix on the command word is ignored.
pub fn parse(text: &str) -> Option<Command> {
    let rest = text.trim().strip_prefix('/')?;
    let mut words = rest.split_whitespace();
    let word = words.next().unwrap_or_default();
    let name = word.split('@').next().unwrap_or_default().to_lowercase();
    let args: Vec<&str> = words.collect();

    let command = match name.as_str() {
        "start" => Command::Start,
        "refresh_activities" => Command::RefreshActivities,
        "set_language" => match args.as_slice() {
            [language] => Command::SetLanguage(Some((*language).to_string())),
            _ => Command::SetLanguage(None),
        },
        "test_prompt" => Command::TestPrompt(parse_test_prompt(&args)),
        _ => Command::Unknown(name),
    };
    Some(command)
}

fn parse_test_prompt(args: &[&str]) -> Option<TestPrompt> {
    let (activity_type, words) = args.split_first()?;
    if words.is_empty() {
        return None;
    }

    let joined = words.join(" ");
    let prompt = joined
        .strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(&joined)
        .trim()
        .to_string();
    if prompt.is_empty() {
        return None;
    }

    Some(TestPrompt {
        activity_type: activity_type.to_lowercase(),
        prompt,
    })
}

impl RenameEngine {
    pub(crate) async fn handle_command(
        &self,
        chat_id: ChatId,
        username: Option<&str>,
        command: Command,
    ) {
        debug!(chat_id, ?command, "handling command");
        let reply = match command {
            Command::Start => self.start(chat_id, username).await,
            Command::RefreshActivities => self.refresh(chat_id).await,
            Command::SetLanguage(Some(language)) => self.set_language(chat_id, language).await,
            Command::SetLanguage(None) => SET_LANGUAGE_USAGE.to_string(),
            Command::TestPrompt(Some(test)) => self.test_prompt(chat_id, test).await,
            Command::TestPrompt(None) => TEST_PROMPT_USAGE.to_string(),
            Command::Unknown(name) => {
                debug!(chat_id, command = name.as_str(), "ignoring unknown command");
                return;
            }
        };
        self.reply(chat_id, reply).await;
    }

    async fn start(&self, chat_id: ChatId, username: Option<&str>) -> String {
        match self.register(chat_id, username).await {
            Ok(()) => format!(
                "Hi! Connect your Strava account to get witty names for new activities:\n{}",
                self.auth_link(chat_id)
            ),
            Err(e) => {
                error!(chat_id, error = %e, "failed to register user");
                GENERIC_FAILURE.to_string()
            }
        }
    }

    async fn register(&self, chat_id: ChatId, username: Option<&str>) -> Result<(), StravachError> {
        let step = self.settings.step_timeout;
        if bounded(step, self.storage.user_exists_by_chat_id(chat_id)).await? {
            return Ok(());
        }
        let user = User::new(chat_id, username.unwrap_or_default());
        let created = bounded(step, self.storage.create_user(&user)).await?;
        info!(chat_id, user_id = created.id, "new user registered");
        Ok(())
    }

    /// Link to the OAuth entry point for this chat.
    pub fn auth_link(&self, chat_id: ChatId) -> String {
        format!(
            "{}/api/auth/{chat_id}",
            self.settings.public_url.trim_end_matches('/')
        )
    }

    async fn refresh(&self, chat_id: ChatId) -> String {
        match self.ingestion.refresh_activities(chat_id).await {
            Ok(created) => format!("Activities refreshed, {created} new."),
            Err(StravachError::NotFound { .. }) => {
                "You are not registered yet, send /start first.".to_string()
            }
            Err(e @ StravachError::CredentialRefreshFailed { .. }) => {
                format!("{e}. Send /start to reconnect Strava.")
            }
            Err(e) => {
                error!(chat_id, error = %e, "failed to refresh activities");
                "Failed to refresh activities. Please try again.".to_string()
            }
        }
    }

    async fn set_language(&self, chat_id: ChatId, language: String) -> String {
        let step = self.settings.step_timeout;
        let result = async {
            let mut user = self.user_for_chat(chat_id).await?;
            user.language = language.clone();
            bounded(step, self.storage.update_user(&user)).await
        }
        .await;

        match result {
            Ok(()) => format!("Language set to {language}."),
            Err(StravachError::NotFound { .. }) => {
                "You are not registered yet, send /start first.".to_string()
            }
            Err(e) => {
                error!(chat_id, error = %e, "failed to update language");
                GENERIC_FAILURE.to_string()
            }
        }
    }

    /// Generate names for a made-up activity. No state is kept.
    async fn test_prompt(&self, chat_id: ChatId, test: TestPrompt) -> String {
        let user = match self.user_for_chat(chat_id).await {
            Ok(user) => user,
            Err(_) => return "User not found. Please authenticate first.".to_string(),
        };
        let activity = UserActivity {
            id: 0,
            user_id: user.id,
            name: "default".into(),
            distance: 0.0,
            moving_time: 0,
            elapsed_time: 0,
            activity_type: test.activity_type,
            start_date: String::new(),
            average_heartrate: 0.0,
            average_speed: 0.0,
            renamed: false,
        };

        match self
            .generate(&activity, &user.language, Some(&test.prompt))
            .await
        {
            Ok(names) => render::numbered_list(&naming::sanitize_all(
                &names,
                self.settings.max_options,
            )),
            Err(e) => {
                debug!(chat_id, error = %e, "test prompt generation failed");
                "Failed to generate names.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_commands_are_not_parsed() {
        assert_eq!(parse("hello there"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse("/start"), Some(Command::Start));
        assert_eq!(parse("/start@stravach_bot"), Some(Command::Start));
        assert_eq!(parse("/refresh_activities"), Some(Command::RefreshActivities));
        assert_eq!(parse("/help"), Some(Command::Unknown("help".into())));
    }

    #[test]
    fn set_language_needs_exactly_one_argument() {
        assert_eq!(
            parse("/set_language Ukrainian"),
            Some(Command::SetLanguage(Some("Ukrainian".into())))
        );
        assert_eq!(parse("/set_language"), Some(Command::SetLanguage(None)));
        assert_eq!(
            parse("/set_language Brazilian Portuguese"),
            Some(Command::SetLanguage(None))
        );
    }

    #[test]
    fn test_prompt_lowercases_type_and_unquotes_prompt() {
        assert_eq!(
            parse(r#"/test_prompt Ride "something about coffee stops""#),
            Some(Command::TestPrompt(Some(TestPrompt {
                activity_type: "ride".into(),
                prompt: "something about coffee stops".into(),
            })))
        );
        assert_eq!(
            parse("/test_prompt Run pirate themed"),
            Some(Command::TestPrompt(Some(TestPrompt {
                activity_type: "run".into(),
                prompt: "pirate themed".into(),
            })))
        );
    }

    #[test]
    fn test_prompt_requires_type_and_prompt() {
        assert_eq!(parse("/test_prompt"), Some(Command::TestPrompt(None)));
        assert_eq!(parse("/test_prompt Run"), Some(Command::TestPrompt(None)));
        assert_eq!(parse(r#"/test_prompt Run """#), Some(Command::TestPrompt(None)));
    }
}
