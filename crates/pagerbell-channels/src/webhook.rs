//! Generic HTTP webhook — POST a small JSON document per event.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use pagerbell_core::error::{PagerbellError, Result};
use pagerbell_core::traits::Notifier;
use pagerbell_core::types::ShiftEvent;
use pagerbell_scheduler::notify::render;

pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            url: url.to_string(),
            client: crate::http_client()?,
        })
    }
}

/// Event names as webhook consumers see them.
pub fn event_type(event: ShiftEvent) -> &'static str {
    match event {
        ShiftEvent::ShiftStarted => "oncall_shift_started",
        ShiftEvent::UpcomingShift => "oncall_shift_upcoming",
        ShiftEvent::ShiftEnded => "oncall_shift_ended",
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, event: ShiftEvent, timestamp: DateTime<Utc>) -> Result<()> {
        let notification = render(event, timestamp, Utc::now());
        let payload = serde_json::json!({
            "message": notification.body,
            "timestamp": notification.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            "event": event_type(event),
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PagerbellError::delivery(format!("Webhook send failed: {e}")))?;

        if resp.status().is_success() {
            tracing::debug!("Webhook accepted {event} at {}", self.url);
            Ok(())
        } else {
            Err(PagerbellError::delivery(format!(
                "webhook returned non-2xx status: {}",
                resp.status()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_posts_event_payload() {
        let mut server = mockito::Server::new_async().await;
        let at = Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap();
        let mock = server
            .mock("POST", "/hook")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "message": "🚨 Your PagerDuty on-call shift has started!",
                "timestamp": "2026-05-04T09:00:00Z",
                "event": "oncall_shift_started",
            })))
            .with_status(204)
            .create_async()
            .await;

        let notifier = WebhookNotifier::new(&format!("{}/hook", server.url())).unwrap();
        notifier.deliver(ShiftEvent::ShiftStarted, at).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_2xx_is_delivery_error() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/hook").with_status(500).create_async().await;

        let notifier = WebhookNotifier::new(&format!("{}/hook", server.url())).unwrap();
        let err = notifier
            .deliver(ShiftEvent::ShiftEnded, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, PagerbellError::Delivery(_)));
    }

    #[test]
    fn test_event_types() {
        assert_eq!(event_type(ShiftEvent::UpcomingShift), "oncall_shift_upcoming");
        assert_eq!(event_type(ShiftEvent::ShiftEnded), "oncall_shift_ended");
    }
}
