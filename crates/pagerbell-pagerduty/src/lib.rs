//! PagerDuty on-call source — REST API v2 `/oncalls`.
//!
//! Answers the two questions the poller asks: is the configured user on call
//! for the schedule right now, and when does their next shift start.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use pagerbell_core::config::PagerDutyConfig;
use pagerbell_core::error::{PagerbellError, Result};
use pagerbell_core::traits::OnCallSource;
use pagerbell_core::types::UpcomingShift;
use serde::Deserialize;

const PAGE_LIMIT: usize = 100;
const MAX_PAGES: usize = 50;

/// One entry of the `/oncalls` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct OnCallEntry {
    pub user: OnCallUser,
    /// Null for entries that started before the query window with no end.
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OnCallUser {
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct OnCallsResponse {
    #[serde(default)]
    oncalls: Vec<OnCallEntry>,
    #[serde(default)]
    more: bool,
}

/// PagerDuty REST client scoped to one schedule.
pub struct PagerDutyClient {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    schedule_id: String,
}

impl PagerDutyClient {
    pub fn new(api_token: &str, schedule_id: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| PagerbellError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: "https://api.pagerduty.com".into(),
            api_token: api_token.to_string(),
            schedule_id: schedule_id.to_string(),
        })
    }

    pub fn from_config(config: &PagerDutyConfig) -> Result<Self> {
        Ok(Self::new(&config.api_token, &config.schedule_id)?.with_base_url(&config.api_url))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// List on-call entries for the schedule, following pagination.
    /// `window` narrows the listing to `(since, until)`; `None` means "now".
    pub async fn list_oncalls(
        &self,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<OnCallEntry>> {
        let mut entries = Vec::new();
        let mut offset = 0usize;

        for _ in 0..MAX_PAGES {
            let mut query = vec![
                ("schedule_ids[]", self.schedule_id.clone()),
                ("limit", PAGE_LIMIT.to_string()),
                ("offset", offset.to_string()),
            ];
            if let Some((since, until)) = window {
                query.push(("since", since.to_rfc3339()));
                query.push(("until", until.to_rfc3339()));
            }

            let response = self
                .client
                .get(format!("{}/oncalls", self.base_url))
                .header("Authorization", format!("Token token={}", self.api_token))
                .header("Accept", "application/vnd.pagerduty+json;version=2")
                .query(&query)
                .send()
                .await
                .map_err(|e| PagerbellError::source(format!("PagerDuty request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(PagerbellError::source(format!(
                    "PagerDuty API error {status}: {body}"
                )));
            }

            let page: OnCallsResponse = response
                .json()
                .await
                .map_err(|e| PagerbellError::source(format!("Invalid PagerDuty response: {e}")))?;

            let count = page.oncalls.len();
            entries.extend(page.oncalls);
            if !page.more || count == 0 {
                return Ok(entries);
            }
            offset += count;
        }

        tracing::warn!("⚠️ PagerDuty pagination stopped after {MAX_PAGES} pages");
        Ok(entries)
    }
}

#[async_trait]
impl OnCallSource for PagerDutyClient {
    fn name(&self) -> &str {
        "pagerduty"
    }

    async fn is_on_call(&self, subject: &str) -> Result<bool> {
        let entries = self.list_oncalls(None).await?;
        Ok(entries.iter().any(|e| e.user.id == subject))
    }

    async fn upcoming_shift(
        &self,
        subject: &str,
        lookahead: Duration,
    ) -> Result<Option<UpcomingShift>> {
        let now = Utc::now();
        let entries = self.list_oncalls(Some((now, now + lookahead))).await?;
        Ok(earliest_future_shift(&entries, subject, now))
    }
}

/// The earliest shift for `subject` starting strictly after `now`.
/// Entries with missing or unparseable times are skipped.
pub fn earliest_future_shift(
    entries: &[OnCallEntry],
    subject: &str,
    now: DateTime<Utc>,
) -> Option<UpcomingShift> {
    entries
        .iter()
        .filter(|e| e.user.id == subject)
        .filter_map(|e| {
            let start = parse_time(e.start.as_deref()?)?;
            let end = parse_time(e.end.as_deref()?)?;
            (start > now).then_some(UpcomingShift { start, end })
        })
        .min_by_key(|s| s.start)
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(t) => Some(t.with_timezone(&Utc)),
        Err(e) => {
            tracing::debug!("Skipping on-call entry with bad time {s:?}: {e}");
            None
        }
    }
}
