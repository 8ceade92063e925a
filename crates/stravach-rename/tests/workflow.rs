// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end rename workflow over mock adapters.

use std::sync::Arc;
use std::time::Duration;

use stravach_rename::queue::EnqueueOutcome;
use stravach_rename::{IngestOutcome, RenameState};
use stravach_test_utils::{TestHarness, fixtures};
use tokio_util::sync::CancellationToken;

const CHAT: i64 = 777;

fn setup() -> (TestHarness, i64) {
    let harness = TestHarness::new();
    let user = harness.seed_user(CHAT);
    harness.seed_activity(42, user.id, "Morning Jog");
    (harness, user.id)
}

async fn offer(harness: &mut TestHarness, names: &[&str]) {
    harness.suggester.push_names(names);
    let activity = harness.storage.activity(42).unwrap();
    assert_eq!(harness.enqueue(activity, CHAT).await, EnqueueOutcome::Enqueued);
    assert_eq!(harness.process_queue().await, 1);
}

#[tokio::test]
async fn morning_jog_becomes_dawn_patrol() {
    let (mut harness, _) = setup();
    offer(&mut harness, &["Sunrise Sprint", "Dawn Patrol"]).await;

    let sent = harness.channel.sent_messages().await;
    assert_eq!(sent.len(), 1);
    let offer_msg = &sent[0];
    assert_eq!(offer_msg.chat_id, CHAT);
    assert_eq!(offer_msg.buttons[0].len(), 2);
    assert_eq!(offer_msg.buttons[0][0].callback_data, "activity:42:1");
    assert_eq!(offer_msg.buttons[0][1].callback_data, "activity:42:2");
    assert!(offer_msg.text.contains("2\\. Dawn Patrol"));

    harness.send_callback(CHAT, "activity:42:2").await;

    assert_eq!(harness.strava.activity(42).unwrap().name, "Dawn Patrol");
    let local = harness.storage.activity(42).unwrap();
    assert!(local.renamed);
    assert_eq!(local.name, "Dawn Patrol");
    assert!(
        harness
            .channel
            .last_text()
            .await
            .unwrap()
            .contains("renamed to \"Dawn Patrol\"")
    );
    assert_eq!(harness.engine.conversations().state(CHAT, 42), RenameState::Idle);

    // Redelivered webhook for the same activity.
    let athlete = harness.storage.user_by_chat(CHAT).unwrap().strava_id.unwrap();
    let outcome = harness
        .engine
        .ingestion()
        .ingest_activity(athlete, 42)
        .await
        .unwrap();
    assert_eq!(outcome, IngestOutcome::AlreadyRenamed);
    assert_eq!(harness.process_queue().await, 0);
}

#[tokio::test]
async fn out_of_range_selection_keeps_offer() {
    let (mut harness, _) = setup();
    offer(&mut harness, &["Sunrise Sprint", "Dawn Patrol"]).await;

    harness.send_callback(CHAT, "activity:42:5").await;

    assert_eq!(
        harness.channel.last_text().await.as_deref(),
        Some("Invalid selection, please regenerate.")
    );
    assert!(!harness.strava.calls().iter().any(|c| c.starts_with("update_activity_name")));
    assert_eq!(
        harness.engine.conversations().get_options(CHAT, 42).unwrap().len(),
        2
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_selections_commit_once() {
    let (mut harness, _) = setup();
    offer(&mut harness, &["Sunrise Sprint", "Dawn Patrol"]).await;
    harness.channel.clear_sent().await;

    let engine_a = Arc::clone(&harness.engine);
    let engine_b = Arc::clone(&harness.engine);
    let a = tokio::spawn(async move {
        engine_a
            .handle_inbound(fixtures::callback(CHAT, "activity:42:1"))
            .await
    });
    let b = tokio::spawn(async move {
        engine_b
            .handle_inbound(fixtures::callback(CHAT, "activity:42:2"))
            .await
    });
    a.await.unwrap();
    b.await.unwrap();

    let writes = harness
        .strava
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("update_activity_name"))
        .count();
    assert_eq!(writes, 1);

    let texts: Vec<String> = harness
        .channel
        .sent_messages()
        .await
        .into_iter()
        .map(|m| m.text)
        .collect();
    assert_eq!(texts.len(), 2);
    assert!(texts.iter().any(|t| t.contains("renamed to")));
    assert!(texts.iter().any(|t| t.contains("no longer available")));
}

#[tokio::test]
async fn regenerate_supersedes_offer() {
    let (mut harness, _) = setup();
    offer(&mut harness, &["Sunrise Sprint", "Dawn Patrol"]).await;

    harness.send_callback(CHAT, "activity:42:0").await;

    assert!(harness.engine.conversations().get_options(CHAT, 42).is_err());
    let answers = harness.channel.callback_answers().await;
    assert_eq!(answers.last().unwrap().text.as_deref(), Some("Generating new names…"));

    harness.suggester.push_names(&["Hill Hustle"]);
    assert_eq!(harness.process_queue().await, 1);
    assert_eq!(
        harness.engine.conversations().get_options(CHAT, 42).unwrap(),
        vec!["Hill Hustle"]
    );

    // The old keyboard's second button now points past the new offer.
    harness.send_callback(CHAT, "activity:42:2").await;
    assert_eq!(
        harness.channel.last_text().await.as_deref(),
        Some("Invalid selection, please regenerate.")
    );
}

#[tokio::test]
async fn custom_prompt_round_trip() {
    let (mut harness, _) = setup();
    offer(&mut harness, &["Sunrise Sprint"]).await;

    harness.send_callback(CHAT, "activity:42:C").await;
    assert_eq!(
        harness.engine.conversations().state(CHAT, 42),
        RenameState::AwaitingFreeTextPrompt
    );
    assert!(harness.channel.last_text().await.unwrap().contains("Send me a few words"));

    harness.suggester.push_names(&["Latte Lap", "Espresso Express"]);
    harness.send_text(CHAT, "  coffee stops  ").await;

    let call = harness.suggester.calls().pop().unwrap();
    assert_eq!(call.prompt.as_deref(), Some("coffee stops"));
    assert_eq!(call.activity_id, 42);
    assert_eq!(
        harness.engine.conversations().state(CHAT, 42),
        RenameState::SuggestionsOffered
    );
    let last = harness.channel.sent_messages().await.pop().unwrap();
    assert!(last.text.contains("Espresso Express"));

    harness.send_callback(CHAT, "activity:42:1").await;
    assert_eq!(harness.strava.activity(42).unwrap().name, "Latte Lap");
}

#[tokio::test]
async fn free_text_outside_prompt_is_ignored() {
    let (mut harness, _) = setup();
    offer(&mut harness, &["Sunrise Sprint"]).await;
    let before = harness.channel.sent_count().await;
    let calls_before = harness.suggester.calls().len();

    harness.send_text(CHAT, "nice run today").await;

    assert_eq!(harness.channel.sent_count().await, before);
    assert_eq!(harness.suggester.calls().len(), calls_before);
}

#[tokio::test]
async fn generation_failure_offers_retry_controls() {
    let (mut harness, _) = setup();
    harness.suggester.push_failure("model overloaded");
    let activity = harness.storage.activity(42).unwrap();
    harness.enqueue(activity, CHAT).await;
    harness.process_queue().await;

    let msg = harness.channel.sent_messages().await.pop().unwrap();
    assert!(msg.text.contains("model overloaded"));
    assert_eq!(msg.buttons.len(), 1);
    assert_eq!(msg.buttons[0][0].callback_data, "activity:42:0");
    assert_eq!(msg.buttons[0][1].callback_data, "activity:42:C");
    assert_eq!(harness.engine.conversations().state(CHAT, 42), RenameState::Idle);
}

#[tokio::test]
async fn blank_suggestions_count_as_failure() {
    let (mut harness, _) = setup();
    harness.suggester.push_names(&["   ", "<>"]);
    let activity = harness.storage.activity(42).unwrap();
    harness.enqueue(activity, CHAT).await;
    harness.process_queue().await;

    let msg = harness.channel.sent_messages().await.pop().unwrap();
    assert!(msg.text.contains("no usable names"));
}

#[tokio::test(start_paused = true)]
async fn slow_suggester_times_out() {
    let mut harness = TestHarness::builder()
        .with_step_timeout(Duration::from_secs(1))
        .build();
    let user = harness.seed_user(CHAT);
    let activity = harness.seed_activity(42, user.id, "Morning Jog");
    harness.suggester.set_delay(Duration::from_secs(60));

    harness.enqueue(activity, CHAT).await;
    harness.process_queue().await;

    let msg = harness.channel.sent_messages().await.pop().unwrap();
    assert!(msg.text.contains("timed out"), "{}", msg.text);
    assert_eq!(msg.buttons.len(), 1);
}

#[tokio::test]
async fn partial_sync_is_reported_distinctly() {
    let (mut harness, _) = setup();
    offer(&mut harness, &["Sunrise Sprint", "Dawn Patrol"]).await;
    harness.storage.fail_update_activity(true);

    harness.send_callback(CHAT, "activity:42:2").await;

    assert_eq!(harness.strava.activity(42).unwrap().name, "Dawn Patrol");
    let text = harness.channel.last_text().await.unwrap();
    assert!(text.contains("local sync failed"), "{text}");
    assert_eq!(harness.engine.conversations().state(CHAT, 42), RenameState::Idle);
}

#[tokio::test]
async fn upstream_write_failure_clears_offer() {
    let (mut harness, _) = setup();
    offer(&mut harness, &["Sunrise Sprint", "Dawn Patrol"]).await;
    harness.strava.fail_write(true);

    harness.send_callback(CHAT, "activity:42:1").await;

    let text = harness.channel.last_text().await.unwrap();
    assert!(text.contains("Strava did not accept"), "{text}");
    assert!(!text.contains("local sync failed"));
    assert!(!harness.storage.activity(42).unwrap().renamed);

    harness.send_callback(CHAT, "activity:42:2").await;
    assert!(harness.channel.last_text().await.unwrap().contains("no longer available"));
}

#[tokio::test]
async fn invalid_payload_is_answered_not_failed() {
    let (harness, _) = setup();
    harness.send_callback(CHAT, "workout:42:1").await;

    assert_eq!(harness.channel.sent_count().await, 0);
    let answers = harness.channel.callback_answers().await;
    assert_eq!(
        answers[0].text.as_deref(),
        Some("Invalid selection, please regenerate.")
    );
}

#[tokio::test]
async fn regenerate_of_foreign_activity_is_rejected() {
    let (mut harness, _) = setup();
    let other = harness.seed_user(888);
    harness.seed_activity(99, other.id, "Not yours");

    harness.send_callback(CHAT, "activity:99:0").await;

    assert_eq!(harness.process_queue().await, 0);
    let answers = harness.channel.callback_answers().await;
    assert_eq!(
        answers[0].text.as_deref(),
        Some("Invalid selection, please regenerate.")
    );
}

#[tokio::test]
async fn renamed_activity_can_still_be_requested_explicitly() {
    let (mut harness, _) = setup();
    let mut activity = harness.storage.activity(42).unwrap();
    activity.renamed = true;
    harness.storage.insert_activity(activity);

    let outcome = harness.engine.ingestion().request_rename(42).await.unwrap();
    assert_eq!(outcome, EnqueueOutcome::Enqueued);
    assert_eq!(harness.process_queue().await, 1);
    assert!(harness.storage.activity(42).unwrap().renamed);

    harness.send_callback(CHAT, "activity:42:1").await;
    let local = harness.storage.activity(42).unwrap();
    assert!(local.renamed);
    assert_eq!(local.name, "Sunrise Sprint");
}

#[tokio::test]
async fn expired_credential_is_persisted_before_upstream_write() {
    let mut harness = TestHarness::new();
    let user = harness.storage.insert_user(fixtures::expired_user(CHAT));
    harness.seed_activity(42, user.id, "Morning Jog");
    offer(&mut harness, &["Sunrise Sprint", "Dawn Patrol"]).await;

    harness.send_callback(CHAT, "activity:42:2").await;

    let log = &harness.log;
    let refreshed = log.position("strava.refresh_token").unwrap();
    let persisted = log.position(&format!("storage.update_user:{}", user.id)).unwrap();
    let written = log
        .position("strava.update_activity_name:42:Dawn Patrol")
        .unwrap();
    assert!(refreshed < persisted);
    assert!(persisted < written);
    assert_eq!(
        harness.storage.user_by_chat(CHAT).unwrap().access_token,
        "access-1"
    );
}

#[tokio::test]
async fn revoked_credential_stops_the_offer() {
    let mut harness = TestHarness::new();
    let user = harness.storage.insert_user(fixtures::expired_user(CHAT));
    let activity = harness.seed_activity(42, user.id, "Morning Jog");
    harness.strava.fail_refresh(true);

    harness.enqueue(activity, CHAT).await;
    harness.process_queue().await;

    assert!(harness.suggester.calls().is_empty());
    assert!(harness.channel.last_text().await.unwrap().contains("/start"));
}

#[tokio::test]
async fn webhook_for_new_activity_mirrors_and_enqueues() {
    let (mut harness, user_id) = setup();
    harness
        .strava
        .insert_activity(fixtures::activity(43, 0, "Lunch Run"));
    let athlete = harness.storage.user_by_chat(CHAT).unwrap().strava_id.unwrap();

    let outcome = harness
        .engine
        .ingestion()
        .ingest_activity(athlete, 43)
        .await
        .unwrap();
    assert_eq!(outcome, IngestOutcome::Queued(EnqueueOutcome::Enqueued));
    assert_eq!(harness.storage.activity(43).unwrap().user_id, user_id);

    let duplicate = harness
        .engine
        .ingestion()
        .ingest_activity(athlete, 43)
        .await
        .unwrap();
    assert_eq!(duplicate, IngestOutcome::Queued(EnqueueOutcome::Duplicate));
    assert_eq!(harness.process_queue().await, 1);

    let unknown = harness
        .engine
        .ingestion()
        .ingest_activity(123_456, 43)
        .await
        .unwrap();
    assert_eq!(unknown, IngestOutcome::UnknownOwner);
}

#[tokio::test]
async fn consumer_loop_runs_until_cancelled() {
    let (mut harness, _) = setup();
    let receiver = harness.take_receiver().unwrap();
    let cancel = CancellationToken::new();
    let consumer = tokio::spawn(Arc::clone(&harness.engine).run_consumer(receiver, cancel.clone()));

    let activity = harness.storage.activity(42).unwrap();
    harness.enqueue(activity, CHAT).await;
    assert!(harness.channel.wait_for_sent(1, Duration::from_secs(5)).await);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), consumer)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn inbound_dispatcher_routes_channel_events() {
    let (mut harness, _) = setup();
    offer(&mut harness, &["Sunrise Sprint"]).await;
    let cancel = CancellationToken::new();
    let dispatcher = tokio::spawn(Arc::clone(&harness.engine).run_inbound(cancel.clone()));

    harness
        .channel
        .inject_message(fixtures::callback(CHAT, "activity:42:1"))
        .await;
    assert!(harness.channel.wait_for_sent(2, Duration::from_secs(5)).await);
    assert_eq!(harness.strava.activity(42).unwrap().name, "Sunrise Sprint");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), dispatcher)
        .await
        .unwrap()
        .unwrap();
}
