///! Telegram Bot API notifier
///!
///! Sends `sendPhoto`/`sendMessage` calls to every configured chat. A
///! notification counts as delivered when at least one chat accepted it;
///! partially failed fan-out is logged but does not trigger a retry storm.

use super::Notifier;
use crate::config::TelegramConfig;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT_SECONDS: u64 = 15;

/// When a caption exceeds the photo caption limit, the photo goes out with
/// this many characters and the full text follows as a separate message.
const TRUNCATED_CAPTION_CHARS: usize = 1000;

pub struct TelegramNotifier {
    client: reqwest::Client,
    token: String,
    chat_ids: Vec<String>,
    caption_max: usize,
}

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        if config.token.is_empty() {
            anyhow::bail!("Telegram token is not configured (telegram.token or TG_TOKEN)");
        }
        if config.chat_ids.is_empty() {
            anyhow::bail!("No Telegram chats configured (telegram.chat_ids or TG_CHAT_IDS)");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()
            .context("Failed to build Telegram HTTP client")?;

        Ok(Self {
            client,
            token: config.token.clone(),
            chat_ids: config.chat_ids.clone(),
            caption_max: config.caption_max,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", TELEGRAM_API_BASE, self.token, method)
    }

    /// Call one Bot API method against every configured chat.
    async fn broadcast(&self, method: &str, params: &[(&str, &str)]) -> Result<()> {
        let mut delivered = 0usize;
        let mut last_error = None;

        for chat_id in &self.chat_ids {
            match self.call_chat(method, chat_id, params).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!("Telegram {} to chat {} failed: {:#}", method, chat_id, e);
                    last_error = Some(e);
                }
            }
        }

        if delivered > 0 {
            if delivered < self.chat_ids.len() {
                tracing::warn!(
                    "Telegram {}: delivered to {}/{} chats",
                    method,
                    delivered,
                    self.chat_ids.len()
                );
            }
            Ok(())
        } else {
            Err(last_error.unwrap_or_else(|| anyhow!("no destination chats")))
        }
    }

    async fn call_chat(&self, method: &str, chat_id: &str, params: &[(&str, &str)]) -> Result<()> {
        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("chat_id", chat_id));

        let response = self
            .client
            .post(self.method_url(method))
            .form(&form)
            .send()
            .await
            .with_context(|| format!("Failed to reach Telegram ({})", method))?;

        let status = response.status();
        let body: ApiResponse = response
            .json()
            .await
            .with_context(|| format!("Unreadable Telegram response ({}, HTTP {})", method, status))?;

        if !body.ok {
            anyhow::bail!(
                "Telegram {} rejected (HTTP {}): {}",
                method,
                status,
                body.description.unwrap_or_else(|| "no description".to_string())
            );
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_photo(&self, photo_url: &str, caption: &str) -> Result<()> {
        if caption.chars().count() <= self.caption_max {
            return self
                .broadcast(
                    "sendPhoto",
                    &[
                        ("photo", photo_url),
                        ("caption", caption),
                        ("parse_mode", "HTML"),
                    ],
                )
                .await;
        }

        // Oversized caption: truncated on the photo, full text as follow-up
        let mut short: String = caption.chars().take(TRUNCATED_CAPTION_CHARS).collect();
        short.push('…');
        self.broadcast(
            "sendPhoto",
            &[
                ("photo", photo_url),
                ("caption", &short),
                ("parse_mode", "HTML"),
            ],
        )
        .await?;
        self.send_text(caption).await
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.broadcast(
            "sendMessage",
            &[
                ("text", text),
                ("parse_mode", "HTML"),
                ("disable_web_page_preview", "true"),
            ],
        )
        .await
    }
}
