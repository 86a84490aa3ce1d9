//! # Pagerbell Channels
//!
//! Where notifications go. Each backend implements
//! [`Notifier`](pagerbell_core::traits::Notifier) and renders its message
//! through [`pagerbell_scheduler::notify::render`].
//!
//! | Backend  | Transport                         | Lifecycle messages |
//! |----------|-----------------------------------|--------------------|
//! | webhook  | JSON POST                         | no                 |
//! | ntfy     | text POST, headers for metadata   | yes                |
//! | pushover | form POST to api.pushover.net     | no                 |

pub mod ntfy;
pub mod pushover;
pub mod webhook;

use std::sync::Arc;
use std::time::Duration;

use pagerbell_core::config::{NotificationBackend, NotificationConfig};
use pagerbell_core::error::{PagerbellError, Result};
use pagerbell_core::traits::Notifier;

pub use ntfy::NtfyNotifier;
pub use pushover::PushoverNotifier;
pub use webhook::WebhookNotifier;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| PagerbellError::config(format!("Failed to build HTTP client: {e}")))
}

/// Build the notifier selected by `config.backend`.
pub fn build_notifier(config: &NotificationConfig) -> Result<Arc<dyn Notifier>> {
    let backend = config
        .backend
        .ok_or_else(|| PagerbellError::config("NOTIFICATION_BACKEND is required"))?;

    let notifier: Arc<dyn Notifier> = match backend {
        NotificationBackend::Webhook => Arc::new(WebhookNotifier::new(&config.webhook.url)?),
        NotificationBackend::Ntfy => Arc::new(NtfyNotifier::from_config(&config.ntfy)?),
        NotificationBackend::Pushover => Arc::new(PushoverNotifier::from_config(&config.pushover)?),
    };
    tracing::debug!("Notification backend ready: {}", notifier.name());
    Ok(notifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_selects_backend() {
        let mut config = NotificationConfig::default();
        config.backend = Some(NotificationBackend::Ntfy);
        config.ntfy.topic = "alerts".into();
        let notifier = build_notifier(&config).unwrap();
        assert_eq!(notifier.name(), "ntfy");
        assert!(notifier.supports_lifecycle());

        config.backend = Some(NotificationBackend::Webhook);
        config.webhook.url = "http://localhost/hook".into();
        assert_eq!(build_notifier(&config).unwrap().name(), "webhook");

        config.backend = Some(NotificationBackend::Pushover);
        assert_eq!(build_notifier(&config).unwrap().name(), "pushover");
    }

    #[test]
    fn test_missing_backend_is_config_error() {
        let err = build_notifier(&NotificationConfig::default()).err().unwrap();
        assert!(matches!(err, PagerbellError::Config(_)));
    }
}
