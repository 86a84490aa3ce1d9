//! Poll loop — ticks at a fixed interval and drives the engine.
//!
//! Cycles never overlap: the interval only re-arms once a cycle body has
//! returned, and shutdown is only observed between cycles.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use pagerbell_core::config::PagerbellConfig;
use pagerbell_core::error::{PagerbellError, Result};
use pagerbell_core::traits::{Notifier, OnCallSource};
use pagerbell_core::types::{ShiftEvent, UpcomingShift};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::engine;
use crate::store::{PersistedState, StateStore};

/// Upper bound on any single source query or delivery.
pub const DEFAULT_CALL_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Poll loop settings.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Monitored subject (PagerDuty user ID).
    pub subject: String,
    pub interval: StdDuration,
    /// Zero disables advance notices.
    pub advance_window: Duration,
    pub lookahead: Duration,
    pub notify_shift_ended: bool,
    pub call_timeout: StdDuration,
}

impl PollerConfig {
    /// Rejects intervals under one second.
    pub fn new(subject: impl Into<String>, interval: StdDuration) -> Result<Self> {
        if interval < StdDuration::from_secs(1) {
            return Err(PagerbellError::config(format!(
                "poll interval must be at least 1s, got {interval:?}"
            )));
        }
        Ok(Self {
            subject: subject.into(),
            interval,
            advance_window: Duration::zero(),
            lookahead: Duration::days(7),
            notify_shift_ended: false,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        })
    }

    pub fn from_config(config: &PagerbellConfig) -> Result<Self> {
        let mut poller = Self::new(config.pagerduty.user_id.clone(), config.check_interval())?;
        poller.advance_window = config.advance_window()?;
        poller.lookahead = config.lookahead();
        poller.notify_shift_ended = config.notify_shift_ended;
        Ok(poller)
    }
}

/// What one cycle did. Used for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// The source could not be queried; nothing else happened.
    pub skipped: bool,
    pub on_call: Option<bool>,
    pub upcoming: Option<UpcomingShift>,
    pub delivered: Vec<ShiftEvent>,
    pub failed: Vec<ShiftEvent>,
    pub saved: bool,
}

/// The poll orchestrator.
pub struct Poller {
    source: Arc<dyn OnCallSource>,
    notifier: Arc<dyn Notifier>,
    store: StateStore,
    config: PollerConfig,
}

impl Poller {
    pub fn new(
        source: Arc<dyn OnCallSource>,
        notifier: Arc<dyn Notifier>,
        store: StateStore,
        config: PollerConfig,
    ) -> Self {
        Self {
            source,
            notifier,
            store,
            config,
        }
    }

    /// Load persisted state. Failure here is the one fatal error.
    pub fn load_state(&self) -> Result<PersistedState> {
        self.store.load()
    }

    /// Run until `shutdown` flips to true (or its sender is dropped).
    /// The first cycle runs immediately.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut state = self.load_state()?;
        tracing::info!(
            "⏰ Poller started (check every {}s, was_on_call={})",
            self.config.interval.as_secs(),
            state.was_on_call
        );

        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        tracing::debug!("Shutdown handle dropped");
                        break;
                    }
                    continue;
                }
                _ = interval.tick() => {}
            }

            let report = self.run_cycle(&mut state).await;
            tracing::debug!("Cycle finished: {report:?}");
        }

        tracing::info!("🛑 Poller stopped");
        Ok(())
    }

    /// One poll cycle over the caller's in-memory state.
    pub async fn run_cycle(&self, state: &mut PersistedState) -> CycleReport {
        let subject = self.config.subject.as_str();

        let on_call = match self.query_on_call(subject).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("⚠️ Error checking on-call status via {}: {e}", self.source.name());
                return CycleReport {
                    skipped: true,
                    ..CycleReport::default()
                };
            }
        };
        tracing::info!("On-call status: {} (previous: {})", on_call, state.was_on_call);

        let mut report = CycleReport {
            on_call: Some(on_call),
            ..CycleReport::default()
        };

        if self.config.advance_window > Duration::zero() {
            self.check_upcoming(subject, state, &mut report).await;
        }

        for event in engine::evaluate(state, on_call, self.config.notify_shift_ended) {
            tracing::info!("🔔 {event} detected, notifying via {}", self.notifier.name());
            match self.deliver(event, Utc::now()).await {
                Ok(()) => {
                    tracing::info!("✅ {event} notification sent");
                    report.delivered.push(event);
                }
                Err(e) => {
                    // The tracked status still advances below.
                    tracing::warn!("⚠️ Failed to send {event} notification: {e}");
                    report.failed.push(event);
                }
            }
        }

        state.was_on_call = on_call;
        match self.store.save(state) {
            Ok(()) => report.saved = true,
            Err(e) => tracing::warn!("⚠️ Failed to save state: {e}"),
        }
        report
    }

    async fn check_upcoming(
        &self,
        subject: &str,
        state: &mut PersistedState,
        report: &mut CycleReport,
    ) {
        let shift = match self.query_upcoming(subject).await {
            Ok(Some(shift)) => shift,
            Ok(None) => {
                tracing::debug!("No upcoming shifts found");
                return;
            }
            Err(e) => {
                tracing::warn!("⚠️ Error checking upcoming shifts: {e}");
                return;
            }
        };
        tracing::info!("Upcoming shift found: starts at {}", shift.start);
        report.upcoming = Some(shift);

        if !engine::should_send_advance_notification(state, shift.start, self.config.advance_window) {
            tracing::debug!("Advance notification not needed (already sent or not in window)");
            return;
        }

        let event = ShiftEvent::UpcomingShift;
        match self.deliver(event, shift.start).await {
            Ok(()) => {
                tracing::info!("✅ Advance notification sent for shift at {}", shift.start);
                engine::record_advance_notification_sent(state);
                report.delivered.push(event);
            }
            Err(e) => {
                // Marker untouched so the next cycle retries inside the window.
                tracing::warn!("⚠️ Failed to send advance notification: {e}");
                report.failed.push(event);
            }
        }
    }

    async fn query_on_call(&self, subject: &str) -> Result<bool> {
        tokio::time::timeout(self.config.call_timeout, self.source.is_on_call(subject))
            .await
            .map_err(|_| PagerbellError::source("on-call query timed out"))?
    }

    async fn query_upcoming(&self, subject: &str) -> Result<Option<UpcomingShift>> {
        tokio::time::timeout(
            self.config.call_timeout,
            self.source.upcoming_shift(subject, self.config.lookahead),
        )
        .await
        .map_err(|_| PagerbellError::source("upcoming shift query timed out"))?
    }

    async fn deliver(&self, event: ShiftEvent, timestamp: chrono::DateTime<Utc>) -> Result<()> {
        tokio::time::timeout(self.config.call_timeout, self.notifier.deliver(event, timestamp))
            .await
            .map_err(|_| PagerbellError::delivery(format!("{event} delivery timed out")))?
    }
}
