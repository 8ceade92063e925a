// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory upstream provider with failure toggles.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use stravach_core::error::StravachError;
use stravach_core::traits::{ActivityProvider, PluginAdapter};
use stravach_core::types::{ActivityId, AdapterType, Credentials, HealthStatus, UserActivity};

use crate::OpLog;

/// Athlete id returned by [`MockStrava::authorize`] unless overridden.
pub const DEFAULT_ATHLETE_ID: i64 = 1001;

/// Authorization code rejected by [`MockStrava::authorize`].
pub const BAD_CODE: &str = "bad-code";

struct State {
    activities: BTreeMap<ActivityId, UserActivity>,
    calls: Vec<String>,
    issued: u32,
    athlete_id: i64,
    fail_refresh: bool,
    fail_write: bool,
    unauthorized_once: bool,
    always_unauthorized: bool,
}

/// An [`ActivityProvider`] over a map of activities.
///
/// Every call is recorded (`refresh_token`, `get_activity:<id>`,
/// `update_activity_name:<id>:<name>`, ...) and mirrored into the optional
/// [`OpLog`] with a `strava.` prefix.
pub struct MockStrava {
    state: Mutex<State>,
    log: Option<OpLog>,
}

impl Default for MockStrava {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStrava {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                activities: BTreeMap::new(),
                calls: Vec::new(),
                issued: 0,
                athlete_id: DEFAULT_ATHLETE_ID,
                fail_refresh: false,
                fail_write: false,
                unauthorized_once: false,
                always_unauthorized: false,
            }),
            log: None,
        }
    }

    pub fn with_log(mut self, log: OpLog) -> Self {
        self.log = Some(log);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, state: &mut State, call: String) {
        if let Some(log) = &self.log {
            log.push(format!("strava.{call}"));
        }
        state.calls.push(call);
    }

    fn check_authorized(state: &mut State) -> Result<(), StravachError> {
        if state.always_unauthorized || std::mem::take(&mut state.unauthorized_once) {
            return Err(StravachError::Unauthorized);
        }
        Ok(())
    }

    fn issue(state: &mut State) -> Credentials {
        state.issued += 1;
        Credentials {
            access_token: format!("access-{}", state.issued),
            refresh_token: format!("refresh-{}", state.issued),
            expires_at: chrono::Utc::now().timestamp() + 6 * 3600,
            athlete_id: Some(state.athlete_id),
            username: Some("mock_athlete".into()),
        }
    }

    pub fn insert_activity(&self, activity: UserActivity) {
        self.state().activities.insert(activity.id, activity);
    }

    pub fn activity(&self, id: ActivityId) -> Option<UserActivity> {
        self.state().activities.get(&id).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn set_athlete_id(&self, athlete_id: i64) {
        self.state().athlete_id = athlete_id;
    }

    /// Token endpoint refuses every refresh.
    pub fn fail_refresh(&self, fail: bool) {
        self.state().fail_refresh = fail;
    }

    /// Name updates fail with a 500.
    pub fn fail_write(&self, fail: bool) {
        self.state().fail_write = fail;
    }

    /// The next API call answers 401.
    pub fn unauthorized_once(&self) {
        self.state().unauthorized_once = true;
    }

    /// Every API call answers 401.
    pub fn always_unauthorized(&self, on: bool) {
        self.state().always_unauthorized = on;
    }
}

fn not_found(id: ActivityId) -> StravachError {
    StravachError::Upstream {
        message: format!("activity {id} not found"),
        status: Some(404),
        source: None,
    }
}

#[async_trait]
impl PluginAdapter for MockStrava {
    fn name(&self) -> &str {
        "mock-strava"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Upstream
    }

    async fn health_check(&self) -> Result<HealthStatus, StravachError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), StravachError> {
        Ok(())
    }
}

#[async_trait]
impl ActivityProvider for MockStrava {
    async fn authorize(&self, code: &str) -> Result<Credentials, StravachError> {
        let mut state = self.state();
        self.record(&mut state, format!("authorize:{code}"));
        if code == BAD_CODE {
            return Err(StravachError::Upstream {
                message: "Bad Request: invalid code".into(),
                status: Some(400),
                source: None,
            });
        }
        Ok(Self::issue(&mut state))
    }

    async fn refresh_token(&self, _refresh_token: &str) -> Result<Credentials, StravachError> {
        let mut state = self.state();
        self.record(&mut state, "refresh_token".into());
        if state.fail_refresh {
            return Err(StravachError::CredentialRefreshFailed {
                message: "invalid refresh token".into(),
            });
        }
        Ok(Self::issue(&mut state))
    }

    async fn get_activity(
        &self,
        _access_token: &str,
        id: ActivityId,
    ) -> Result<UserActivity, StravachError> {
        let mut state = self.state();
        self.record(&mut state, format!("get_activity:{id}"));
        Self::check_authorized(&mut state)?;
        state.activities.get(&id).cloned().ok_or_else(|| not_found(id))
    }

    async fn update_activity_name(
        &self,
        _access_token: &str,
        id: ActivityId,
        name: &str,
    ) -> Result<UserActivity, StravachError> {
        let mut state = self.state();
        self.record(&mut state, format!("update_activity_name:{id}:{name}"));
        Self::check_authorized(&mut state)?;
        if state.fail_write {
            return Err(StravachError::Upstream {
                message: "Internal Server Error".into(),
                status: Some(500),
                source: None,
            });
        }
        let activity = state.activities.get_mut(&id).ok_or_else(|| not_found(id))?;
        activity.name = name.to_string();
        Ok(activity.clone())
    }

    async fn list_activities(
        &self,
        _access_token: &str,
    ) -> Result<Vec<UserActivity>, StravachError> {
        let mut state = self.state();
        self.record(&mut state, "list_activities".into());
        Self::check_authorized(&mut state)?;
        Ok(state.activities.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn unauthorized_once_is_consumed() {
        let strava = MockStrava::new();
        strava.insert_activity(fixtures::activity(42, 1, "Morning Jog"));
        strava.unauthorized_once();

        assert!(matches!(
            strava.get_activity("t", 42).await,
            Err(StravachError::Unauthorized)
        ));
        assert!(strava.get_activity("t", 42).await.is_ok());
    }

    #[tokio::test]
    async fn refresh_issues_new_tokens() {
        let strava = MockStrava::new();
        let first = strava.refresh_token("r").await.unwrap();
        let second = strava.refresh_token("r").await.unwrap();
        assert_ne!(first.access_token, second.access_token);
        assert_eq!(strava.calls(), vec!["refresh_token", "refresh_token"]);
    }
}
