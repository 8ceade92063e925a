// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keeps a user's upstream access credential valid.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use stravach_core::error::StravachError;
use stravach_core::traits::{ActivityProvider, StorageAdapter};
use stravach_core::types::User;
use tracing::{debug, info, warn};

use crate::bounded;

/// Refreshes and persists credentials ahead of upstream calls.
#[derive(Clone)]
pub struct TokenGuard {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    provider: Arc<dyn ActivityProvider + Send + Sync>,
    step_timeout: Duration,
}

impl TokenGuard {
    pub fn new(
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        provider: Arc<dyn ActivityProvider + Send + Sync>,
        step_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            provider,
            step_timeout,
        }
    }

    /// Refresh the credential if it is unset or expired.
    ///
    /// On success the refreshed user has been persisted before this returns.
    /// On failure `user` is left as it was and the caller must not proceed.
    pub async fn ensure_fresh(&self, user: &mut User) -> Result<(), StravachError> {
        let now = chrono::Utc::now().timestamp();
        if !user.credential_expired(now) {
            return Ok(());
        }
        debug!(user_id = user.id, "access credential expired, refreshing");
        self.refresh(user).await
    }

    /// Unconditionally exchange the refresh credential and persist the result.
    pub async fn refresh(&self, user: &mut User) -> Result<(), StravachError> {
        if user.refresh_token.is_empty() {
            return Err(StravachError::CredentialRefreshFailed {
                message: "no Strava authorization on file, use /start to connect".into(),
            });
        }

        let credentials = bounded(
            self.step_timeout,
            self.provider.refresh_token(&user.refresh_token),
        )
        .await
        .map_err(|e| match e {
            e @ (StravachError::CredentialRefreshFailed { .. } | StravachError::Timeout { .. }) => e,
            other => StravachError::CredentialRefreshFailed {
                message: other.to_string(),
            },
        })?;

        let mut refreshed = user.clone();
        refreshed.apply_credentials(&credentials);
        bounded(self.step_timeout, self.storage.update_user(&refreshed)).await?;

        info!(user_id = user.id, "access credential refreshed");
        *user = refreshed;
        Ok(())
    }

    /// Run an upstream call with a fresh credential.
    ///
    /// An `Unauthorized` answer triggers exactly one forced refresh and one
    /// retry. A second `Unauthorized` is returned to the caller.
    pub async fn with_reauth<T, F, Fut>(&self, user: &mut User, op: F) -> Result<T, StravachError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, StravachError>>,
    {
        self.ensure_fresh(user).await?;

        match bounded(self.step_timeout, op(user.access_token.clone())).await {
            Err(StravachError::Unauthorized) => {
                warn!(user_id = user.id, "upstream rejected credential, re-authenticating once");
                self.refresh(user).await?;
                bounded(self.step_timeout, op(user.access_token.clone())).await
            }
            other => other,
        }
    }
}
