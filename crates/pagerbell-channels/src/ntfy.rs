//! ntfy — plain-text POST to `{server}/{topic}` with metadata in headers.
//! Also carries the birth/will lifecycle messages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagerbell_core::config::NtfyConfig;
use pagerbell_core::error::{PagerbellError, Result};
use pagerbell_core::traits::Notifier;
use pagerbell_core::types::{Lifecycle, ShiftEvent};
use pagerbell_scheduler::notify::{Notification, NotifyPriority, render, render_lifecycle};

pub struct NtfyNotifier {
    server_url: String,
    topic: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl NtfyNotifier {
    pub fn new(server_url: &str, topic: &str, api_key: Option<&str>) -> Result<Self> {
        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            topic: topic.to_string(),
            api_key: api_key.filter(|k| !k.is_empty()).map(str::to_string),
            client: crate::http_client()?,
        })
    }

    pub fn from_config(config: &NtfyConfig) -> Result<Self> {
        Self::new(&config.server_url, &config.topic, config.api_key.as_deref())
    }

    fn topic_url(&self) -> String {
        format!("{}/{}", self.server_url, self.topic)
    }

    async fn publish(&self, notification: &Notification, tags: &str) -> Result<()> {
        let mut req = self
            .client
            .post(self.topic_url())
            .header("Title", &notification.title)
            .header("Priority", priority_header(notification.priority))
            .header("Tags", tags)
            .body(notification.body.clone());
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| PagerbellError::delivery(format!("failed to send ntfy notification: {e}")))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(PagerbellError::delivery(format!(
                "ntfy returned non-2xx status: {}",
                resp.status().as_u16()
            )))
        }
    }
}

fn priority_header(priority: NotifyPriority) -> &'static str {
    match priority {
        NotifyPriority::Urgent => "urgent",
        NotifyPriority::Normal => "default",
        NotifyPriority::Low => "low",
    }
}

fn event_tags(event: ShiftEvent) -> &'static str {
    match event {
        ShiftEvent::ShiftStarted => "rotating_light,alarm_clock",
        ShiftEvent::UpcomingShift => "alarm_clock,clock1",
        ShiftEvent::ShiftEnded => "white_check_mark,beach_with_umbrella",
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    fn name(&self) -> &str {
        "ntfy"
    }

    async fn deliver(&self, event: ShiftEvent, timestamp: DateTime<Utc>) -> Result<()> {
        let notification = render(event, timestamp, Utc::now());
        self.publish(&notification, event_tags(event)).await
    }

    async fn announce(&self, lifecycle: Lifecycle) -> Result<()> {
        let tags = match lifecycle {
            Lifecycle::Started => "white_check_mark",
            Lifecycle::Stopping => "x",
        };
        self.publish(&render_lifecycle(lifecycle), tags).await
    }

    fn supports_lifecycle(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_sends_shift_started_event() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/alerts")
            .match_header("title", "PagerDuty On-Call Shift Started")
            .match_header("priority", "urgent")
            .match_header("tags", "rotating_light,alarm_clock")
            .match_header("authorization", "Bearer secret-key")
            .match_body("🚨 Your PagerDuty on-call shift has started!")
            .with_status(200)
            .create_async()
            .await;

        let notifier = NtfyNotifier::new(&server.url(), "alerts", Some("secret-key")).unwrap();
        notifier
            .deliver(ShiftEvent::ShiftStarted, Utc::now())
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_auth_header_without_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/alerts")
            .match_header("authorization", Matcher::Missing)
            .match_header("priority", "default")
            .with_status(200)
            .create_async()
            .await;

        let notifier = NtfyNotifier::new(&server.url(), "alerts", Some("")).unwrap();
        notifier
            .deliver(ShiftEvent::ShiftEnded, Utc::now())
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_propagates_http_error() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/alerts").with_status(500).create_async().await;

        let notifier = NtfyNotifier::new(&server.url(), "alerts", None).unwrap();
        let err = notifier
            .deliver(ShiftEvent::ShiftStarted, Utc::now())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_lifecycle_messages() {
        let mut server = mockito::Server::new_async().await;
        let birth = server
            .mock("POST", "/alerts")
            .match_header("title", "PagerDuty Notifier Started")
            .match_header("priority", "low")
            .match_header("tags", "white_check_mark")
            .match_body("Birth message")
            .with_status(200)
            .create_async()
            .await;
        let will = server
            .mock("POST", "/alerts")
            .match_header("title", "PagerDuty Notifier Stopped")
            .match_header("tags", "x")
            .match_body("Will message")
            .with_status(200)
            .create_async()
            .await;

        let notifier = NtfyNotifier::new(&server.url(), "alerts", None).unwrap();
        assert!(notifier.supports_lifecycle());
        notifier.announce(Lifecycle::Started).await.unwrap();
        notifier.announce(Lifecycle::Stopping).await.unwrap();
        birth.assert_async().await;
        will.assert_async().await;
    }
}
