//! Shared data types passed between the poller, the source and the notifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to the monitored subject's on-call status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftEvent {
    /// OFF_CALL → ON_CALL.
    ShiftStarted,
    /// ON_CALL → OFF_CALL.
    ShiftEnded,
    /// A known shift begins within the advance window.
    UpcomingShift,
}

impl ShiftEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShiftStarted => "shift_started",
            Self::ShiftEnded => "shift_ended",
            Self::UpcomingShift => "upcoming_shift",
        }
    }
}

impl fmt::Display for ShiftEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The nearest future shift for the subject. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingShift {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Process lifecycle announcements ("birth" and "will" messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Started,
    Stopping,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => f.write_str("started"),
            Self::Stopping => f.write_str("stopping"),
        }
    }
}
