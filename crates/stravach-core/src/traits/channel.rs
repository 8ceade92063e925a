// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport adapter trait.

use async_trait::async_trait;

use crate::error::StravachError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundMessage, MessageId, OutboundMessage};

/// Adapter for the bidirectional chat transport.
///
/// Inbound text messages and button taps are both delivered through
/// [`receive`](ChannelAdapter::receive); outbound messages may carry a button
/// grid whose payloads are opaque to the transport.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), StravachError>;

    /// Sends a message, optionally with an inline keyboard.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, StravachError>;

    /// Receives the next inbound event from the channel.
    async fn receive(&self) -> Result<InboundMessage, StravachError>;

    /// Acknowledges a button tap so the client stops its spinner.
    async fn answer_callback(
        &self,
        query_id: &str,
        text: Option<&str>,
    ) -> Result<(), StravachError>;
}
