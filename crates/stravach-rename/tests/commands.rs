// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use stravach_test_utils::{TestHarness, fixtures};

#[tokio::test]
async fn start_registers_and_links_oauth() {
    let harness = TestHarness::new();
    harness.send_text(555, "/start").await;

    let user = harness.storage.user_by_chat(555).unwrap();
    assert_eq!(user.username, "athlete555");
    assert!(user.strava_id.is_none());
    let text = harness.channel.last_text().await.unwrap();
    assert!(text.ends_with("https://bot.example.com/api/auth/555"), "{text}");

    // A second /start keeps the existing row.
    harness.send_text(555, "/start").await;
    assert_eq!(harness.storage.user_by_chat(555).unwrap().id, user.id);
}

#[tokio::test]
async fn set_language_updates_user() {
    let harness = TestHarness::new();
    harness.seed_user(777);

    harness.send_text(777, "/set_language Ukrainian").await;
    assert_eq!(harness.storage.user_by_chat(777).unwrap().language, "Ukrainian");
    assert_eq!(
        harness.channel.last_text().await.as_deref(),
        Some("Language set to Ukrainian.")
    );

    harness.send_text(777, "/set_language").await;
    assert!(harness.channel.last_text().await.unwrap().starts_with("Usage"));
}

#[tokio::test]
async fn refresh_activities_mirrors_new_ones_without_offering() {
    let mut harness = TestHarness::new();
    let user = harness.seed_user(777);
    harness.seed_activity(42, user.id, "Morning Jog");
    harness.strava.insert_activity(fixtures::activity(43, 0, "Lunch Run"));
    harness.strava.insert_activity(fixtures::activity(44, 0, "Evening Ride"));

    harness.send_text(777, "/refresh_activities").await;

    assert_eq!(
        harness.channel.last_text().await.as_deref(),
        Some("Activities refreshed, 2 new.")
    );
    assert_eq!(harness.storage.activity(44).unwrap().user_id, user.id);
    assert_eq!(harness.storage.activity(42).unwrap().name, "Morning Jog");
    assert_eq!(harness.process_queue().await, 0);
}

#[tokio::test]
async fn refresh_activities_requires_registration() {
    let harness = TestHarness::new();
    harness.send_text(999, "/refresh_activities").await;
    assert!(harness.channel.last_text().await.unwrap().contains("/start"));
}

#[tokio::test]
async fn refresh_retries_once_after_rejection() {
    let harness = TestHarness::new();
    harness.seed_user(777);
    harness.strava.insert_activity(fixtures::activity(43, 0, "Lunch Run"));
    harness.strava.unauthorized_once();

    harness.send_text(777, "/refresh_activities").await;

    assert_eq!(
        harness.strava.calls(),
        vec!["list_activities", "refresh_token", "list_activities"]
    );
    assert_eq!(
        harness.channel.last_text().await.as_deref(),
        Some("Activities refreshed, 1 new.")
    );
}

#[tokio::test]
async fn test_prompt_lists_names_without_state() {
    let harness = TestHarness::new();
    harness.seed_user(777);
    harness.suggester.push_names(&["Pedal Pirates", "Rum Ride"]);

    harness
        .send_text(777, r#"/test_prompt Ride "pirate themed""#)
        .await;

    assert_eq!(
        harness.channel.last_text().await.as_deref(),
        Some("1. Pedal Pirates\n2. Rum Ride")
    );
    let call = harness.suggester.calls().pop().unwrap();
    assert_eq!(call.prompt.as_deref(), Some("pirate themed"));
    assert!(harness.engine.conversations().get_last_activity(777).is_err());
}

#[tokio::test]
async fn unknown_commands_are_silent() {
    let harness = TestHarness::new();
    harness.seed_user(777);
    harness.send_text(777, "/help").await;
    assert_eq!(harness.channel.sent_count().await, 0);
}
