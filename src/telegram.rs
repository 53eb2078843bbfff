use crate::config::AppConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

// ── Bot API payloads ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UpdatesEnvelope {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

/// One incoming event from getUpdates. Only message updates carry anything
/// we act on; everything else deserializes with `message: None` and is
/// skipped by the dispatcher.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
}

// ── Errors ──────────────────────────────────────────────────────────────

/// Poll failure, split so the run loop can treat a 409 — a second instance
/// polling the same bot token — as a warning instead of a generic error.
#[derive(Debug)]
pub enum PollError {
    Conflict,
    Other(anyhow::Error),
}

// ── Client ──────────────────────────────────────────────────────────────

/// Minimal Telegram Bot API client: long-poll getUpdates plus sendMessage,
/// driven directly over reqwest.
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(config: &AppConfig, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!(
                "{}/bot{}",
                config.telegram_api_url.trim_end_matches('/'),
                token
            ),
            poll_timeout: Duration::from_secs(config.poll_timeout_secs),
        }
    }

    /// Long-poll for updates past `offset`. Blocks up to the configured
    /// poll timeout server-side; the HTTP timeout adds headroom on top.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, PollError> {
        let body = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout.as_secs(),
        };

        let resp = self
            .client
            .post(format!("{}/getUpdates", self.base_url))
            .json(&body)
            .timeout(self.poll_timeout + Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| PollError::Other(anyhow!("getUpdates request failed: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::CONFLICT {
            return Err(PollError::Conflict);
        }
        if !status.is_success() {
            return Err(PollError::Other(anyhow!("getUpdates returned {status}")));
        }

        let envelope: UpdatesEnvelope = resp
            .json()
            .await
            .map_err(|e| PollError::Other(anyhow!("getUpdates body unreadable: {e}")))?;

        if !envelope.ok {
            return Err(PollError::Other(anyhow!("getUpdates replied ok=false")));
        }

        Ok(envelope.result)
    }

    /// Send one text reply to a chat.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let resp = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .context("sendMessage request failed")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("sendMessage returned {status}"));
        }
        Ok(())
    }
}
