// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat conversation state for the rename workflow.
//!
//! Each (chat, activity) pair carries an explicit [`RenameState`] plus the
//! options last offered for it. A pair with no entry is [`RenameState::Idle`].
//! Every operation on a pair runs under that pair's map shard lock, so
//! concurrent callbacks for the same pair are serialized.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use stravach_core::error::StravachError;
use stravach_core::types::{ActivityId, ChatId};

/// Workflow state of one (chat, activity) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameState {
    /// Nothing offered.
    Idle,
    /// Options were sent and are waiting for a tap.
    SuggestionsOffered,
    /// The user asked to type their own prompt.
    AwaitingFreeTextPrompt,
    /// A selection was claimed and is being written upstream.
    Committing,
}

impl fmt::Display for RenameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameState::Idle => write!(f, "idle"),
            RenameState::SuggestionsOffered => write!(f, "suggestions_offered"),
            RenameState::AwaitingFreeTextPrompt => write!(f, "awaiting_free_text_prompt"),
            RenameState::Committing => write!(f, "committing"),
        }
    }
}

/// Inputs that move a pair between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameEvent {
    /// A fresh batch of options was generated.
    OptionsStored,
    /// A numeric button was tapped and its option claimed.
    SelectionClaimed,
    /// The regenerate button was tapped.
    Regenerated,
    /// The custom-prompt button was tapped.
    CustomPromptRequested,
    /// The free-text prompt arrived.
    PromptReceived,
    /// The commit finished, successfully or not.
    CommitFinished,
}

impl RenameState {
    /// The transition table. `None` means the event is not accepted in this state.
    pub fn next(self, event: RenameEvent) -> Option<RenameState> {
        use RenameEvent as E;
        use RenameState as S;

        match (self, event) {
            (S::Idle | S::SuggestionsOffered | S::AwaitingFreeTextPrompt, E::OptionsStored) => {
                Some(S::SuggestionsOffered)
            }
            (S::SuggestionsOffered | S::AwaitingFreeTextPrompt, E::SelectionClaimed) => {
                Some(S::Committing)
            }
            (S::Idle | S::SuggestionsOffered | S::AwaitingFreeTextPrompt, E::Regenerated) => {
                Some(S::Idle)
            }
            (
                S::Idle | S::SuggestionsOffered | S::AwaitingFreeTextPrompt,
                E::CustomPromptRequested,
            ) => Some(S::AwaitingFreeTextPrompt),
            (S::AwaitingFreeTextPrompt, E::PromptReceived) => Some(S::SuggestionsOffered),
            (S::Committing, E::CommitFinished) => Some(S::Idle),
            _ => None,
        }
    }
}

/// Result of tapping a numeric option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The option was claimed; the caller must commit it and then call
    /// [`ConversationStore::finish_commit`].
    Claimed(String),
    /// The index is outside the current offer. The offer is left untouched.
    OutOfRange { available: usize },
    /// Nothing is on offer any more (consumed, superseded or never stored).
    NoLongerAvailable,
}

#[derive(Debug, Clone)]
struct PairState {
    state: RenameState,
    options: Vec<String>,
}

/// Shared, cloneable conversation store.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    pairs: Arc<DashMap<(ChatId, ActivityId), PairState>>,
    last_activity: Arc<DashMap<ChatId, ActivityId>>,
}

fn rejected(state: RenameState, event: RenameEvent) -> StravachError {
    StravachError::InvalidCallback(format!("{event:?} not accepted while {state}"))
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a pair.
    pub fn state(&self, chat_id: ChatId, activity_id: ActivityId) -> RenameState {
        self.pairs
            .get(&(chat_id, activity_id))
            .map(|pair| pair.state)
            .unwrap_or(RenameState::Idle)
    }

    /// Store a new batch of options, superseding any earlier batch.
    ///
    /// Rejected while the pair is committing.
    pub fn set_options(
        &self,
        chat_id: ChatId,
        activity_id: ActivityId,
        options: Vec<String>,
    ) -> Result<(), StravachError> {
        if options.is_empty() {
            return Err(StravachError::Internal(
                "refusing to store an empty option list".into(),
            ));
        }

        match self.pairs.entry((chat_id, activity_id)) {
            Entry::Occupied(mut occupied) => {
                let pair = occupied.get_mut();
                let state = pair.state;
                pair.state = state
                    .next(RenameEvent::OptionsStored)
                    .ok_or_else(|| rejected(state, RenameEvent::OptionsStored))?;
                pair.options = options;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(PairState {
                    state: RenameState::SuggestionsOffered,
                    options,
                });
            }
        }
        Ok(())
    }

    /// Options currently on offer for a pair.
    pub fn get_options(
        &self,
        chat_id: ChatId,
        activity_id: ActivityId,
    ) -> Result<Vec<String>, StravachError> {
        self.pairs
            .get(&(chat_id, activity_id))
            .filter(|pair| !pair.options.is_empty())
            .map(|pair| pair.options.clone())
            .ok_or_else(|| StravachError::NotFound {
                entity: "name options",
                id: format!("{chat_id}/{activity_id}"),
            })
    }

    /// Forget everything about a pair.
    pub fn clear(&self, chat_id: ChatId, activity_id: ActivityId) {
        self.pairs.remove(&(chat_id, activity_id));
        self.last_activity.remove_if(&chat_id, |_, last| *last == activity_id);
    }

    /// Make `activity_id` the chat's free-text target.
    ///
    /// A different activity that was waiting for a prompt falls back to its
    /// offer, or to idle if it had none.
    pub fn set_last_activity(&self, chat_id: ChatId, activity_id: ActivityId) {
        let previous = self.last_activity.insert(chat_id, activity_id);
        if let Some(previous) = previous.filter(|prev| *prev != activity_id) {
            self.pairs.remove_if_mut(&(chat_id, previous), |_, pair| {
                if pair.state != RenameState::AwaitingFreeTextPrompt {
                    return false;
                }
                if pair.options.is_empty() {
                    return true;
                }
                pair.state = RenameState::SuggestionsOffered;
                false
            });
        }
    }

    pub fn get_last_activity(&self, chat_id: ChatId) -> Result<ActivityId, StravachError> {
        self.last_activity
            .get(&chat_id)
            .map(|last| *last)
            .ok_or_else(|| StravachError::NotFound {
                entity: "last activity",
                id: chat_id.to_string(),
            })
    }

    /// Atomically claim option `index` (1-based).
    ///
    /// Of several concurrent claims on the same pair exactly one wins; the
    /// others observe the consumed offer and get [`Selection::NoLongerAvailable`].
    pub fn claim_selection(
        &self,
        chat_id: ChatId,
        activity_id: ActivityId,
        index: usize,
    ) -> Selection {
        let Some(mut pair) = self.pairs.get_mut(&(chat_id, activity_id)) else {
            return Selection::NoLongerAvailable;
        };
        if pair.options.is_empty() {
            return Selection::NoLongerAvailable;
        }
        if index == 0 || index > pair.options.len() {
            return Selection::OutOfRange {
                available: pair.options.len(),
            };
        }
        let Some(next) = pair.state.next(RenameEvent::SelectionClaimed) else {
            return Selection::NoLongerAvailable;
        };

        let name = pair.options.swap_remove(index - 1);
        pair.options.clear();
        pair.state = next;
        Selection::Claimed(name)
    }

    /// Drop a pair's offer ahead of a new batch.
    pub fn regenerate(
        &self,
        chat_id: ChatId,
        activity_id: ActivityId,
    ) -> Result<(), StravachError> {
        if let Entry::Occupied(occupied) = self.pairs.entry((chat_id, activity_id)) {
            let state = occupied.get().state;
            state
                .next(RenameEvent::Regenerated)
                .ok_or_else(|| rejected(state, RenameEvent::Regenerated))?;
            occupied.remove();
        }
        self.last_activity.remove_if(&chat_id, |_, last| *last == activity_id);
        Ok(())
    }

    /// Wait for a free-text prompt for this pair. Existing options are kept.
    pub fn begin_custom_prompt(
        &self,
        chat_id: ChatId,
        activity_id: ActivityId,
    ) -> Result<(), StravachError> {
        match self.pairs.entry((chat_id, activity_id)) {
            Entry::Occupied(mut occupied) => {
                let pair = occupied.get_mut();
                let state = pair.state;
                pair.state = state
                    .next(RenameEvent::CustomPromptRequested)
                    .ok_or_else(|| rejected(state, RenameEvent::CustomPromptRequested))?;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(PairState {
                    state: RenameState::AwaitingFreeTextPrompt,
                    options: Vec::new(),
                });
            }
        }
        self.set_last_activity(chat_id, activity_id);
        Ok(())
    }

    /// Consume the chat's pending free-text target, if any.
    ///
    /// Returns `None` unless the chat's last activity is waiting for a prompt.
    pub fn take_prompt_target(&self, chat_id: ChatId) -> Option<ActivityId> {
        let activity_id = self.last_activity.get(&chat_id).map(|last| *last)?;
        {
            let mut pair = self.pairs.get_mut(&(chat_id, activity_id))?;
            pair.state = pair.state.next(RenameEvent::PromptReceived)?;
        }
        self.last_activity.remove_if(&chat_id, |_, last| *last == activity_id);
        Some(activity_id)
    }

    /// Return a committing pair to idle.
    pub fn finish_commit(&self, chat_id: ChatId, activity_id: ActivityId) {
        self.pairs.remove_if(&(chat_id, activity_id), |_, pair| {
            pair.state.next(RenameEvent::CommitFinished).is_some()
        });
        self.last_activity.remove_if(&chat_id, |_, last| *last == activity_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn transition_table_rejects_events_while_committing() {
        for event in [
            RenameEvent::OptionsStored,
            RenameEvent::SelectionClaimed,
            RenameEvent::Regenerated,
            RenameEvent::CustomPromptRequested,
            RenameEvent::PromptReceived,
        ] {
            assert_eq!(RenameState::Committing.next(event), None, "{event:?}");
        }
        assert_eq!(
            RenameState::Committing.next(RenameEvent::CommitFinished),
            Some(RenameState::Idle)
        );
        assert_eq!(RenameState::Idle.next(RenameEvent::SelectionClaimed), None);
        assert_eq!(
            RenameState::SuggestionsOffered.next(RenameEvent::PromptReceived),
            None
        );
    }

    #[test]
    fn set_and_get_options() {
        let store = ConversationStore::new();
        assert!(store.get_options(777, 42).is_err());

        store.set_options(777, 42, names(&["A", "B"])).unwrap();
        assert_eq!(store.get_options(777, 42).unwrap(), names(&["A", "B"]));
        assert_eq!(store.state(777, 42), RenameState::SuggestionsOffered);

        store.set_options(777, 42, names(&["C"])).unwrap();
        assert_eq!(store.get_options(777, 42).unwrap(), names(&["C"]));

        store.clear(777, 42);
        assert!(store.get_options(777, 42).is_err());
        assert_eq!(store.state(777, 42), RenameState::Idle);
    }

    #[test]
    fn pairs_are_independent() {
        let store = ConversationStore::new();
        store.set_options(1, 42, names(&["A"])).unwrap();
        store.set_options(2, 42, names(&["B"])).unwrap();
        store.set_options(1, 43, names(&["C"])).unwrap();

        assert_eq!(store.get_options(2, 42).unwrap(), names(&["B"]));
        store.clear(1, 42);
        assert_eq!(store.get_options(1, 43).unwrap(), names(&["C"]));
    }

    #[test]
    fn claim_consumes_offer() {
        let store = ConversationStore::new();
        store
            .set_options(777, 42, names(&["Sunrise Sprint", "Dawn Patrol"]))
            .unwrap();

        assert_eq!(
            store.claim_selection(777, 42, 2),
            Selection::Claimed("Dawn Patrol".into())
        );
        assert_eq!(store.state(777, 42), RenameState::Committing);
        assert_eq!(store.claim_selection(777, 42, 1), Selection::NoLongerAvailable);

        store.finish_commit(777, 42);
        assert_eq!(store.state(777, 42), RenameState::Idle);
    }

    #[test]
    fn out_of_range_leaves_offer_untouched() {
        let store = ConversationStore::new();
        store.set_options(777, 42, names(&["A", "B"])).unwrap();

        assert_eq!(
            store.claim_selection(777, 42, 3),
            Selection::OutOfRange { available: 2 }
        );
        assert_eq!(
            store.claim_selection(777, 42, 0),
            Selection::OutOfRange { available: 2 }
        );
        assert_eq!(store.get_options(777, 42).unwrap(), names(&["A", "B"]));
        assert_eq!(store.state(777, 42), RenameState::SuggestionsOffered);
    }

    #[test]
    fn claim_without_offer_is_no_longer_available() {
        let store = ConversationStore::new();
        assert_eq!(store.claim_selection(777, 42, 1), Selection::NoLongerAvailable);
    }

    #[test]
    fn concurrent_claims_have_one_winner() {
        for _ in 0..50 {
            let store = ConversationStore::new();
            store.set_options(777, 42, names(&["A", "B", "C"])).unwrap();

            let outcomes: Vec<Selection> = std::thread::scope(|scope| {
                let handles: Vec<_> = [1, 2]
                    .into_iter()
                    .map(|index| {
                        let store = store.clone();
                        scope.spawn(move || store.claim_selection(777, 42, index))
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            let winners = outcomes
                .iter()
                .filter(|o| matches!(o, Selection::Claimed(_)))
                .count();
            assert_eq!(winners, 1, "{outcomes:?}");
            assert!(outcomes.contains(&Selection::NoLongerAvailable));
        }
    }

    #[test]
    fn regenerate_clears_offer_and_prompt_target() {
        let store = ConversationStore::new();
        store.set_options(777, 42, names(&["A"])).unwrap();
        store.begin_custom_prompt(777, 42).unwrap();

        store.regenerate(777, 42).unwrap();
        assert!(store.get_options(777, 42).is_err());
        assert!(store.get_last_activity(777).is_err());
    }

    #[test]
    fn regenerate_rejected_while_committing() {
        let store = ConversationStore::new();
        store.set_options(777, 42, names(&["A"])).unwrap();
        let _ = store.claim_selection(777, 42, 1);

        assert!(matches!(
            store.regenerate(777, 42),
            Err(StravachError::InvalidCallback(_))
        ));
        assert!(store.set_options(777, 42, names(&["B"])).is_err());
    }

    #[test]
    fn custom_prompt_keeps_options() {
        let store = ConversationStore::new();
        store.set_options(777, 42, names(&["A", "B"])).unwrap();
        store.begin_custom_prompt(777, 42).unwrap();

        assert_eq!(store.state(777, 42), RenameState::AwaitingFreeTextPrompt);
        assert_eq!(store.get_last_activity(777).unwrap(), 42);
        assert_eq!(
            store.claim_selection(777, 42, 1),
            Selection::Claimed("A".into())
        );
    }

    #[test]
    fn prompt_target_is_consumed_once() {
        let store = ConversationStore::new();
        assert_eq!(store.take_prompt_target(777), None);

        store.begin_custom_prompt(777, 42).unwrap();
        assert_eq!(store.take_prompt_target(777), Some(42));
        assert_eq!(store.take_prompt_target(777), None);
        assert_eq!(store.state(777, 42), RenameState::SuggestionsOffered);
    }

    #[test]
    fn newer_prompt_target_supersedes_older() {
        let store = ConversationStore::new();
        store.set_options(777, 41, names(&["Old"])).unwrap();
        store.begin_custom_prompt(777, 41).unwrap();
        store.begin_custom_prompt(777, 42).unwrap();

        assert_eq!(store.state(777, 41), RenameState::SuggestionsOffered);
        assert_eq!(store.get_options(777, 41).unwrap(), names(&["Old"]));
        assert_eq!(store.take_prompt_target(777), Some(42));
    }

    #[test]
    fn stale_prompt_target_without_waiting_state_is_ignored() {
        let store = ConversationStore::new();
        store.begin_custom_prompt(777, 42).unwrap();
        store.set_options(777, 42, names(&["Fresh"])).unwrap();

        assert_eq!(store.take_prompt_target(777), None);
    }
}
