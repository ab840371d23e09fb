use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::notify::{NotifyError, TelegramSend};

pub const TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TelegramSend for TelegramClient {
    async fn send_message(
        &self,
        token: &str,
        chat_id: &str,
        text: &str,
        reply_markup: Value,
    ) -> Result<(), NotifyError> {
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "reply_markup": reply_markup,
        });

        let res = self
            .http
            .post(format!("{}/bot{}/sendMessage", self.base_url, token))
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }

        Ok(())
    }
}
