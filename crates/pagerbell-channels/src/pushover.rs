//! Pushover — form-encoded POST to the messages API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagerbell_core::config::PushoverConfig;
use pagerbell_core::error::{PagerbellError, Result};
use pagerbell_core::traits::Notifier;
use pagerbell_core::types::ShiftEvent;
use pagerbell_scheduler::notify::{NotifyPriority, render};

pub const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

pub struct PushoverNotifier {
    app_token: String,
    user_key: String,
    device: Option<String>,
    sound: Option<String>,
    api_url: String,
    client: reqwest::Client,
}

impl PushoverNotifier {
    pub fn from_config(config: &PushoverConfig) -> Result<Self> {
        Ok(Self {
            app_token: config.app_token.clone(),
            user_key: config.user_key.clone(),
            device: config.device.clone().filter(|d| !d.is_empty()),
            sound: config.sound.clone().filter(|s| !s.is_empty()),
            api_url: PUSHOVER_API_URL.into(),
            client: crate::http_client()?,
        })
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.to_string();
        self
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    fn name(&self) -> &str {
        "pushover"
    }

    async fn deliver(&self, event: ShiftEvent, timestamp: DateTime<Utc>) -> Result<()> {
        let notification = render(event, timestamp, Utc::now());
        // Pushover high priority (1) bypasses quiet hours; only a live shift earns it.
        let priority = match notification.priority {
            NotifyPriority::Urgent => "1",
            _ => "0",
        };

        let mut form = vec![
            ("token", self.app_token.clone()),
            ("user", self.user_key.clone()),
            ("message", notification.body),
            ("title", notification.title),
            ("priority", priority.to_string()),
            ("timestamp", notification.timestamp.timestamp().to_string()),
        ];
        if let Some(device) = &self.device {
            form.push(("device", device.clone()));
        }
        if let Some(sound) = &self.sound {
            form.push(("sound", sound.clone()));
        }

        let resp = self
            .client
            .post(&self.api_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| PagerbellError::delivery(format!("failed to send pushover notification: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(PagerbellError::delivery(format!(
                "pushover returned non-2xx status: {} - {body}",
                status.as_u16()
            )))
        }
    }
}
