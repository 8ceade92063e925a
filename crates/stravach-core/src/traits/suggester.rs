// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Name suggestion trait.

use async_trait::async_trait;

use crate::error::StravachError;
use crate::traits::adapter::PluginAdapter;
use crate::types::UserActivity;

/// Turns an activity description into an ordered list of candidate names.
///
/// Implementations are stateless between calls. A successful result always
/// holds at least one non-empty string; anything else is
/// [`StravachError::GenerationFailed`].
#[async_trait]
pub trait NameSuggester: PluginAdapter {
    async fn generate(
        &self,
        activity: &UserActivity,
        language: &str,
    ) -> Result<Vec<String>, StravachError>;

    /// Like [`generate`](NameSuggester::generate) but steered by the user's own text.
    async fn generate_with_prompt(
        &self,
        activity: &UserActivity,
        language: &str,
        prompt: &str,
    ) -> Result<Vec<String>, StravachError>;
}
