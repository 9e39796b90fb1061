//! Chat channel abstractions
//!
//! Inbound messages arrive from whatever chat platform adapter drives the
//! tracker; outbound posts go through `OutputChannel`. Mention lists for
//! warnings and shaming are built with `IdentityResolver`.

use async_trait::async_trait;

use crate::errors::OutputError;
use crate::types::{AttachmentHandle, ChannelId, MessageRef, PlayerName};

// ----------------------------------------------------------------------------
// Inbound Messages
// ----------------------------------------------------------------------------

/// A chat message delivered by the platform adapter
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub author: PlayerName,
    pub channel: ChannelId,
    pub message: MessageRef,
    pub content: String,
    pub attachment: Option<InboundAttachment>,
}

/// First attachment of an inbound message
#[derive(Debug, Clone)]
pub struct InboundAttachment {
    pub bytes: Vec<u8>,
    /// Only spoilered attachments are accepted as result screenshots
    pub spoiler: bool,
}

impl InboundMessage {
    /// A plain text message
    pub fn text(
        author: impl Into<PlayerName>,
        channel: ChannelId,
        message: MessageRef,
        content: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            channel,
            message,
            content: content.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, bytes: Vec<u8>, spoiler: bool) -> Self {
        self.attachment = Some(InboundAttachment { bytes, spoiler });
        self
    }
}

// ----------------------------------------------------------------------------
// Output Channel
// ----------------------------------------------------------------------------

/// Outbound side of the chat platform
#[async_trait]
pub trait OutputChannel: Send + Sync {
    /// Post a text message
    async fn post(&self, channel: &ChannelId, text: &str) -> Result<(), OutputError>;

    /// Post a text message with a stored attachment
    async fn post_with_attachment(
        &self,
        channel: &ChannelId,
        text: &str,
        handle: &AttachmentHandle,
        bytes: &[u8],
    ) -> Result<(), OutputError>;

    /// Display token for addressing a user who just wrote to us
    fn mention(&self, user: &PlayerName) -> String;

    /// Remove a message from the visible history
    async fn delete_message(&self, message: &MessageRef) -> Result<(), OutputError>;
}

// ----------------------------------------------------------------------------
// Identity Resolution
// ----------------------------------------------------------------------------

/// Resolves roster names to platform mention tokens
pub trait IdentityResolver: Send + Sync {
    /// Mention token for the user, `None` if the platform does not know them
    fn resolve_user(&self, name: &PlayerName) -> Option<String>;
}
