//! Delivery guard — suppresses sends to recipients that are permanently
//! unreachable (blocked the bot, deactivated their account, etc.).
//!
//! Classification is process-lifetime: once a chat is marked unreachable
//! it stays suppressed until restart.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::outbound::{Keyboard, Outbound};

/// Wraps an [`Outbound`] transport, skipping sends to known-unreachable
/// chats and classifying fresh unreachable failures.
pub struct DeliveryGuard {
    inner: Arc<dyn Outbound>,
    blocked: RwLock<HashSet<i64>>,
}

impl DeliveryGuard {
    pub fn new(inner: Arc<dyn Outbound>) -> Self {
        Self {
            inner,
            blocked: RwLock::new(HashSet::new()),
        }
    }

    async fn is_blocked(&self, chat_id: i64) -> bool {
        self.blocked.read().await.contains(&chat_id)
    }

    /// Swallow an unreachable-recipient failure, recording the chat;
    /// propagate anything else.
    async fn classify(&self, chat_id: i64, err: ChannelError) -> Result<(), ChannelError> {
        if is_unreachable(&err) {
            warn!(chat_id, %err, "Recipient unreachable; suppressing future sends");
            self.blocked.write().await.insert(chat_id);
            return Ok(());
        }
        Err(err)
    }
}

/// Whether a transport failure indicates the recipient is permanently
/// unreachable, from the Bot API error description.
fn is_unreachable(err: &ChannelError) -> bool {
    let ChannelError::SendFailed { reason, .. } = err else {
        return false;
    };
    let reason = reason.to_ascii_lowercase();
    reason.contains("bot was blocked by the user")
        || reason.contains("user is deactivated")
        || reason.contains("bot was kicked")
        || reason.contains("forbidden")
}

#[async_trait]
impl Outbound for DeliveryGuard {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), ChannelError> {
        if self.is_blocked(chat_id).await {
            debug!(chat_id, "Skipping send to unreachable recipient");
            return Ok(());
        }
        match self.inner.send_text(chat_id, text, keyboard).await {
            Ok(()) => Ok(()),
            Err(e) => self.classify(chat_id, e).await,
        }
    }

    async fn send_media_group(
        &self,
        chat_id: i64,
        photos: &[String],
        caption: &str,
    ) -> Result<(), ChannelError> {
        if self.is_blocked(chat_id).await {
            debug!(chat_id, "Skipping send to unreachable recipient");
            return Ok(());
        }
        match self.inner.send_media_group(chat_id, photos, caption).await {
            Ok(()) => Ok(()),
            Err(e) => self.classify(chat_id, e).await,
        }
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), ChannelError> {
        // Callback acks are not chat-addressed; pass them through.
        self.inner.answer_callback(callback_id).await
    }
}
