//! Telegram Bot API client using raw reqwest (no framework).
//!
//! Uses long-polling via `getUpdates` for inbound commands and `sendMessage`
//! for outbound delivery. Plain (non-command) messages are ignored — herald
//! only reacts to slash commands.

use super::{Channel, ChannelEvent, OutboundMessage};
use async_trait::async_trait;
use color_eyre::eyre::Result;
use serde::Deserialize;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

/// Maximum message length for Telegram (we chunk below this).
const MAX_MESSAGE_LEN: usize = 4000;

/// Telegram Bot API client.
pub struct TelegramChannel {
    bot_token: String,
    allowed_user_ids: Vec<i64>,
    client: reqwest::Client,
}

// --- Telegram API response types ---

#[derive(Debug, Deserialize)]
struct TgResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgUpdate {
    update_id: i64,
    message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    chat: TgChat,
    from: Option<TgUser>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TgUser {
    id: i64,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    username: Option<String>,
}

impl TelegramChannel {
    pub fn new(bot_token: String, allowed_user_ids: Vec<i64>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("failed to build reqwest client");

        Self {
            bot_token,
            allowed_user_ids,
            client,
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    fn is_user_allowed(&self, user_id: i64) -> bool {
        self.allowed_user_ids.is_empty() || self.allowed_user_ids.contains(&user_id)
    }

    /// Parse a message into a command event. Non-command text yields None.
    fn parse_message(msg: &TgMessage) -> Option<ChannelEvent> {
        let text = msg.text.as_deref()?.trim();
        let rest = text.strip_prefix('/')?;
        if rest.is_empty() {
            return None;
        }

        let user = msg.from.as_ref()?;
        let user_name = user
            .username
            .clone()
            .unwrap_or_else(|| user.first_name.clone());

        // Split command from args: "/boards abc" -> ("boards", "abc")
        let (command, args) = match rest.split_once(' ') {
            Some((cmd, args)) => (cmd, args),
            None => (rest, ""),
        };
        // Strip @botname suffix from commands like "/boards@mybot"
        let command = command.split('@').next().unwrap_or(command);

        Some(ChannelEvent::Command {
            chat_id: msg.chat.id,
            user_id: user.id,
            user_name,
            command: command.to_owned(),
            args: args.trim().to_owned(),
        })
    }

    /// Long-poll for updates from Telegram.
    async fn get_updates(&self, offset: i64) -> Result<Vec<TgUpdate>> {
        let resp = self
            .client
            .get(self.api_url("getUpdates"))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", "30".to_string()),
            ])
            .send()
            .await?;

        let body: TgResponse<Vec<TgUpdate>> = resp.json().await?;

        if !body.ok {
            let desc = body.description.unwrap_or_default();
            color_eyre::eyre::bail!("Telegram API error: {desc}");
        }

        Ok(body.result.unwrap_or_default())
    }

    /// Send a text message, chunking if necessary.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        for chunk in chunk_message(text) {
            let payload = serde_json::json!({
                "chat_id": chat_id,
                "text": chunk,
                "parse_mode": "Markdown",
            });

            let resp = self
                .client
                .post(self.api_url("sendMessage"))
                .json(&payload)
                .send()
                .await?;

            let body: TgResponse<serde_json::Value> = resp.json().await?;
            if !body.ok {
                // Retry without Markdown if parse_mode fails.
                let fallback = serde_json::json!({
                    "chat_id": chat_id,
                    "text": chunk,
                });

                let resp = self
                    .client
                    .post(self.api_url("sendMessage"))
                    .json(&fallback)
                    .send()
                    .await?;

                let body: TgResponse<serde_json::Value> = resp.json().await?;
                if !body.ok {
                    let desc = body.description.unwrap_or_default();
                    color_eyre::eyre::bail!("sendMessage failed: {desc}");
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn run(&self, tx: Sender<ChannelEvent>, cancel: CancellationToken) {
        let mut offset: i64 = 0;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let updates = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.get_updates(offset) => {
                    match result {
                        Ok(updates) => updates,
                        Err(e) => {
                            eprintln!("[telegram] Poll error: {e}");
                            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                            continue;
                        }
                    }
                }
            };

            for update in updates {
                offset = update.update_id + 1;

                let Some(msg) = update.message else {
                    continue;
                };

                // Check user authorization.
                if let Some(user) = &msg.from
                    && !self.is_user_allowed(user.id)
                {
                    eprintln!(
                        "[telegram] Ignoring message from unauthorized user {}",
                        user.id
                    );
                    continue;
                }

                if let Some(event) = Self::parse_message(&msg)
                    && tx.send(event).await.is_err()
                {
                    // Receiver dropped — shut down.
                    return;
                }
            }
        }
    }

    async fn send_message(&self, msg: &OutboundMessage) -> Result<()> {
        self.send_text(msg.chat_id, &msg.text).await
    }
}

/// Escape special characters for Telegram Markdown.
///
/// Use this on dynamic content (card names, comment text) to prevent
/// Telegram's Markdown parser from misinterpreting special characters.
/// Do NOT use this on structural Markdown that we control (e.g. `*bold*`).
pub fn escape_markdown(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            result.push('\\');
        }
        result.push(ch);
    }
    result
}

/// Split a message into chunks that fit within Telegram's limit.
fn chunk_message(text: &str) -> Vec<&str> {
    if text.len() <= MAX_MESSAGE_LEN {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= MAX_MESSAGE_LEN {
            chunks.push(remaining);
            break;
        }

        // Try to split at a newline within the limit.
        let split_at = remaining[..MAX_MESSAGE_LEN]
            .rfind('\n')
            .unwrap_or(MAX_MESSAGE_LEN);

        let (chunk, rest) = remaining.split_at(split_at);
        chunks.push(chunk);
        // Skip the newline we split on.
        remaining = rest.strip_prefix('\n').unwrap_or(rest);
    }

    chunks
}
