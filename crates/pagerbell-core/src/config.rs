//! Pagerbell configuration system.
//!
//! Values come from an optional TOML file and are then overlaid by
//! environment variables, so a container can be configured with env alone.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{PagerbellError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagerbellConfig {
    #[serde(default)]
    pub pagerduty: PagerDutyConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    /// Poll interval in whole seconds.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    /// Go-style duration ("2h", "30m", "1h30m"). Absent = advance notices disabled.
    #[serde(default)]
    pub advance_notification: Option<String>,
    /// How far ahead to search for the next shift.
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: u32,
    #[serde(default)]
    pub notify_shift_ended: bool,
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

fn default_check_interval() -> u64 { 300 }
fn default_lookahead_days() -> u32 { 7 }
fn default_state_file() -> String { "/data/state.json".into() }
fn default_pagerduty_url() -> String { "https://api.pagerduty.com".into() }

impl Default for PagerbellConfig {
    fn default() -> Self {
        Self {
            pagerduty: PagerDutyConfig::default(),
            notification: NotificationConfig::default(),
            check_interval_secs: default_check_interval(),
            advance_notification: None,
            lookahead_days: default_lookahead_days(),
            notify_shift_ended: false,
            state_file: default_state_file(),
        }
    }
}

/// PagerDuty REST API access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagerDutyConfig {
    #[serde(default)]
    pub api_token: String,
    #[serde(default)]
    pub schedule_id: String,
    /// The monitored subject.
    #[serde(default)]
    pub user_id: String,
    #[serde(default = "default_pagerduty_url")]
    pub api_url: String,
}

impl Default for PagerDutyConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            schedule_id: String::new(),
            user_id: String::new(),
            api_url: default_pagerduty_url(),
        }
    }
}

/// Which notification backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationBackend {
    Webhook,
    Ntfy,
    Pushover,
}

impl FromStr for NotificationBackend {
    type Err = PagerbellError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "webhook" => Ok(Self::Webhook),
            "ntfy" => Ok(Self::Ntfy),
            "pushover" => Ok(Self::Pushover),
            other => Err(PagerbellError::config(format!(
                "NOTIFICATION_BACKEND must be 'webhook', 'ntfy' or 'pushover', got: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for NotificationBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Webhook => f.write_str("webhook"),
            Self::Ntfy => f.write_str("ntfy"),
            Self::Pushover => f.write_str("pushover"),
        }
    }
}

/// Notification backend selection and per-backend settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub backend: Option<NotificationBackend>,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub ntfy: NtfyConfig,
    #[serde(default)]
    pub pushover: PushoverConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NtfyConfig {
    #[serde(default)]
    pub server_url: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushoverConfig {
    #[serde(default)]
    pub app_token: String,
    #[serde(default)]
    pub user_key: String,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub sound: Option<String>,
}

impl PagerbellConfig {
    /// Load config: TOML file (explicit path, else the default path if present),
    /// then environment overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from(p)?,
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::load_from(&default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a specific TOML file, without env or validation.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PagerbellError::config(format!("Failed to read config {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| PagerbellError::config(format!("Failed to parse config: {e}")))
    }

    /// Get the default config path (~/.pagerbell/config.toml).
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pagerbell")
            .join("config.toml")
    }

    /// Overlay environment variables. Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PD_API_TOKEN") {
            self.pagerduty.api_token = v;
        }
        if let Some(v) = get("PD_SCHEDULE_ID") {
            self.pagerduty.schedule_id = v;
        }
        if let Some(v) = get("PD_USER_ID") {
            self.pagerduty.user_id = v;
        }
        if let Some(v) = get("PD_API_URL") {
            self.pagerduty.api_url = v;
        }

        if let Some(v) = get("NOTIFICATION_BACKEND") {
            self.notification.backend = Some(v.parse()?);
        }
        if let Some(v) = get("NOTIFICATION_WEBHOOK_URL") {
            self.notification.webhook.url = v;
        }
        if let Some(v) = get("NTFY_SERVER_URL") {
            self.notification.ntfy.server_url = v;
        }
        if let Some(v) = get("NTFY_TOPIC") {
            self.notification.ntfy.topic = v;
        }
        if let Some(v) = get("NTFY_API_KEY") {
            self.notification.ntfy.api_key = Some(v);
        }
        if let Some(v) = get("PUSHOVER_APP_TOKEN") {
            self.notification.pushover.app_token = v;
        }
        if let Some(v) = get("PUSHOVER_USER_KEY") {
            self.notification.pushover.user_key = v;
        }
        if let Some(v) = get("PUSHOVER_DEVICE") {
            self.notification.pushover.device = Some(v);
        }
        if let Some(v) = get("PUSHOVER_SOUND") {
            self.notification.pushover.sound = Some(v);
        }

        if let Some(v) = get("CHECK_INTERVAL") {
            let secs: i64 = v.trim().parse().map_err(|e| {
                PagerbellError::config(format!("CHECK_INTERVAL must be a valid integer: {e}"))
            })?;
            if secs <= 0 {
                return Err(PagerbellError::config("CHECK_INTERVAL must be greater than 0"));
            }
            self.check_interval_secs = secs as u64;
        }
        if let Some(v) = get("ADVANCE_NOTIFICATION_TIME") {
            self.advance_notification = Some(v);
        }
        if let Some(v) = get("LOOKAHEAD_DAYS") {
            self.lookahead_days = v.trim().parse().map_err(|e| {
                PagerbellError::config(format!("LOOKAHEAD_DAYS must be a valid integer: {e}"))
            })?;
        }
        if let Some(v) = get("NOTIFY_SHIFT_ENDED") {
            self.notify_shift_ended = parse_bool(&v).ok_or_else(|| {
                PagerbellError::config(format!("NOTIFY_SHIFT_ENDED must be a boolean, got: {v}"))
            })?;
        }
        if let Some(v) = get("STATE_FILE_PATH") {
            self.state_file = v;
        }
        Ok(())
    }

    /// Check required fields and value ranges.
    pub fn validate(&self) -> Result<()> {
        require(&self.pagerduty.api_token, "PD_API_TOKEN environment variable is required")?;
        require(&self.pagerduty.schedule_id, "PD_SCHEDULE_ID environment variable is required")?;
        require(&self.pagerduty.user_id, "PD_USER_ID environment variable is required")?;

        let backend = self.notification.backend.ok_or_else(|| {
            PagerbellError::config(
                "NOTIFICATION_BACKEND environment variable is required (must be 'webhook', 'ntfy' or 'pushover')",
            )
        })?;
        match backend {
            NotificationBackend::Webhook => require(
                &self.notification.webhook.url,
                "NOTIFICATION_WEBHOOK_URL environment variable is required when using webhook backend",
            )?,
            NotificationBackend::Ntfy => {
                require(
                    &self.notification.ntfy.server_url,
                    "NTFY_SERVER_URL environment variable is required when using ntfy backend",
                )?;
                require(
                    &self.notification.ntfy.topic,
                    "NTFY_TOPIC environment variable is required when using ntfy backend",
                )?;
            }
            NotificationBackend::Pushover => {
                require(
                    &self.notification.pushover.app_token,
                    "PUSHOVER_APP_TOKEN environment variable is required when using pushover backend",
                )?;
                require(
                    &self.notification.pushover.user_key,
                    "PUSHOVER_USER_KEY environment variable is required when using pushover backend",
                )?;
            }
        }

        if self.check_interval_secs == 0 {
            return Err(PagerbellError::config("CHECK_INTERVAL must be greater than 0"));
        }
        if self.lookahead_days == 0 {
            return Err(PagerbellError::config("LOOKAHEAD_DAYS must be greater than 0"));
        }
        self.advance_window()?;
        Ok(())
    }

    /// Poll interval.
    pub fn check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.check_interval_secs)
    }

    /// Advance-notification window; zero when the feature is disabled.
    pub fn advance_window(&self) -> Result<Duration> {
        let Some(raw) = &self.advance_notification else {
            return Ok(Duration::zero());
        };
        let window = humantime::parse_duration(raw.trim())
            .ok()
            .and_then(|d| Duration::from_std(d).ok())
            .ok_or_else(|| {
                PagerbellError::config(format!(
                    "ADVANCE_NOTIFICATION_TIME must be a valid duration (e.g., '2h', '30m', '1h30m'), got {raw:?}"
                ))
            })?;
        if window <= Duration::zero() {
            return Err(PagerbellError::config("ADVANCE_NOTIFICATION_TIME must be greater than 0"));
        }
        Ok(window)
    }

    /// Upcoming-shift search horizon.
    pub fn lookahead(&self) -> Duration {
        Duration::days(i64::from(self.lookahead_days))
    }
}

fn require(value: &str, msg: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(PagerbellError::config(msg))
    } else {
        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
