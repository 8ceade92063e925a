// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible `/chat/completions` endpoints.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use stravach_core::StravachError;
use tracing::debug;

use crate::types::{ApiErrorResponse, ChatMessage, ChatRequest, ChatResponse};

/// Chat completion client.
///
/// Every failure, including transport errors and timeouts, is reported as
/// [`StravachError::GenerationFailed`]: callers only care that no names came back.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// `base_url` ends at the API version, e.g. `https://api.openai.com/v1`.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StravachError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| StravachError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| StravachError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system + user exchange and return the assistant text.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, StravachError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    format!("no response within {:?}", self.timeout)
                } else {
                    format!("HTTP request failed: {e}")
                };
                StravachError::GenerationFailed { message }
            })?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "completion response received");

        let body = response
            .text()
            .await
            .map_err(|e| StravachError::GenerationFailed {
                message: format!("failed to read response body: {e}"),
            })?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!("API error ({status}): {}", api_err.error.message),
                Err(_) => format!("API returned {status}"),
            };
            return Err(StravachError::GenerationFailed { message });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| StravachError::GenerationFailed {
                message: format!("malformed completion response: {e}"),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| StravachError::GenerationFailed {
                message: "completion contained no text".into(),
            })
    }
}
