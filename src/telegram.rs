//! Telegram channel — long-polls the Bot API for updates and implements
//! the outbound send primitives.

use async_trait::async_trait;
use futures::Stream;
use secrecy::{ExposeSecret, SecretString};

use crate::error::ChannelError;
use crate::listings::model::PropertyKind;
use crate::outbound::{Keyboard, Outbound, menu};

/// One inbound user event from Telegram.
#[derive(Debug, Clone, PartialEq)]
pub struct Incoming {
    pub user_id: i64,
    pub chat_id: i64,
    pub kind: IncomingKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IncomingKind {
    Text(String),
    /// Photo upload; carries the `file_id` of the largest size.
    Photo(String),
    /// Inline-button tap; `id` must be acknowledged via answerCallbackQuery.
    Callback { id: String, data: String },
}

/// Stream of inbound events produced by the long-poll task.
pub type UpdateStream = std::pin::Pin<Box<dyn Stream<Item = Incoming> + Send>>;

/// Telegram channel — connects to the Bot API via long-polling.
#[derive(Clone)]
pub struct TelegramChannel {
    bot_token: SecretString,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: SecretString) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{method}",
            self.bot_token.expose_secret()
        )
    }

    /// Verify the token with getMe.
    pub async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                reason: e.to_string(),
            })?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    /// Spawn the long-poll loop and return the inbound event stream.
    pub fn start(&self) -> UpdateStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let channel = self.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for updates...");

            loop {
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": 30,
                    "allowed_updates": ["message", "callback_query"]
                });

                let resp = match channel
                    .client
                    .post(channel.api_url("getUpdates"))
                    .json(&body)
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let data: serde_json::Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                if let Some(results) = data.get("result").and_then(serde_json::Value::as_array) {
                    for update in results {
                        if let Some(uid) =
                            update.get("update_id").and_then(serde_json::Value::as_i64)
                        {
                            offset = uid + 1;
                        }

                        let Some(incoming) = parse_update(update) else {
                            continue;
                        };

                        if tx.send(incoming).is_err() {
                            tracing::info!("Telegram listener channel closed");
                            return;
                        }
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Box::pin(stream)
    }

    async fn post_checked(
        &self,
        method: &'static str,
        body: serde_json::Value,
    ) -> Result<(), ChannelError> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                method: method.to_string(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            return Ok(());
        }

        // The error description is what the delivery guard classifies on
        // (e.g. "Forbidden: bot was blocked by the user").
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(ChannelError::SendFailed {
            method: method.to_string(),
            reason: format!("{status}: {body}"),
        })
    }
}

#[async_trait]
impl Outbound for TelegramChannel {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), ChannelError> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(markup) = keyboard_markup(keyboard) {
            body["reply_markup"] = markup;
        }
        self.post_checked("sendMessage", body).await
    }

    async fn send_media_group(
        &self,
        chat_id: i64,
        photos: &[String],
        caption: &str,
    ) -> Result<(), ChannelError> {
        // Listings without photos can exist in the store; fall back to text.
        if photos.is_empty() {
            return self.send_text(chat_id, caption, &Keyboard::None).await;
        }
        let body = serde_json::json!({
            "chat_id": chat_id,
            "media": media_group(photos, caption),
        });
        self.post_checked("sendMediaGroup", body).await
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), ChannelError> {
        self.post_checked(
            "answerCallbackQuery",
            serde_json::json!({ "callback_query_id": callback_id }),
        )
        .await
    }
}

// ── Update parsing ──────────────────────────────────────────────────

/// Extract an [`Incoming`] event from one raw update, if it is a kind the
/// bot handles.
fn parse_update(update: &serde_json::Value) -> Option<Incoming> {
    if let Some(message) = update.get("message") {
        let user_id = message.get("from")?.get("id")?.as_i64()?;
        let chat_id = message.get("chat")?.get("id")?.as_i64()?;

        if let Some(text) = message.get("text").and_then(serde_json::Value::as_str) {
            return Some(Incoming {
                user_id,
                chat_id,
                kind: IncomingKind::Text(text.to_string()),
            });
        }

        // Telegram sends several sizes per photo; the last is the largest.
        if let Some(sizes) = message.get("photo").and_then(serde_json::Value::as_array) {
            let file_id = sizes.last()?.get("file_id")?.as_str()?;
            return Some(Incoming {
                user_id,
                chat_id,
                kind: IncomingKind::Photo(file_id.to_string()),
            });
        }

        return None;
    }

    if let Some(callback) = update.get("callback_query") {
        let id = callback.get("id")?.as_str()?.to_string();
        let user_id = callback.get("from")?.get("id")?.as_i64()?;
        let chat_id = callback
            .get("message")
            .and_then(|m| m.get("chat"))
            .and_then(|c| c.get("id"))
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(user_id);
        let data = callback.get("data")?.as_str()?.to_string();
        return Some(Incoming {
            user_id,
            chat_id,
            kind: IncomingKind::Callback { id, data },
        });
    }

    None
}

// ── Markup builders ─────────────────────────────────────────────────

fn reply_keyboard(rows: Vec<Vec<&str>>) -> serde_json::Value {
    serde_json::json!({
        "keyboard": rows,
        "resize_keyboard": true,
    })
}

/// The 12 property-type labels in rows of three.
fn kind_rows() -> Vec<Vec<&'static str>> {
    PropertyKind::ALL
        .chunks(3)
        .map(|chunk| chunk.iter().map(|k| k.label()).collect())
        .collect()
}

fn keyboard_markup(keyboard: &Keyboard) -> Option<serde_json::Value> {
    match keyboard {
        Keyboard::None => None,
        Keyboard::Main => Some(reply_keyboard(vec![
            vec![menu::SEARCH, menu::UPLOAD],
            vec![menu::WEBSITE, menu::CONTACT_AGENT],
        ])),
        Keyboard::UploadKinds => {
            let mut rows = kind_rows();
            rows.push(vec![menu::BACK_TO_MAIN]);
            Some(reply_keyboard(rows))
        }
        Keyboard::SearchKinds => {
            let mut rows = vec![vec!["Any"]];
            rows.extend(kind_rows());
            rows.push(vec![menu::BACK_TO_MAIN]);
            Some(reply_keyboard(rows))
        }
        Keyboard::SkipPrice => Some(reply_keyboard(vec![
            vec!["Skip"],
            vec![menu::BACK_TO_MAIN],
        ])),
        Keyboard::AnyLocation => Some(reply_keyboard(vec![
            vec!["Any"],
            vec![menu::BACK_TO_MAIN],
        ])),
        Keyboard::Inline(buttons) => {
            let row: Vec<serde_json::Value> = buttons
                .iter()
                .map(|b| {
                    serde_json::json!({
                        "text": b.label,
                        "callback_data": b.action.data(),
                    })
                })
                .collect();
            Some(serde_json::json!({ "inline_keyboard": [row] }))
        }
    }
}

/// sendMediaGroup payload: the caption rides on the first photo only.
fn media_group(photos: &[String], caption: &str) -> serde_json::Value {
    let media: Vec<serde_json::Value> = photos
        .iter()
        .enumerate()
        .map(|(i, file_id)| {
            let mut item = serde_json::json!({
                "type": "photo",
                "media": file_id,
            });
            if i == 0 {
                item["caption"] = serde_json::Value::String(caption.to_string());
            }
            item
        })
        .collect();
    serde_json::Value::Array(media)
}

// ── Tests ───────────────────────────────────────────────────────────
