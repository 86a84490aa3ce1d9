//! Notifier trait — transport-specific delivery of shift events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{Lifecycle, ShiftEvent};

/// A notification backend (webhook, ntfy, Pushover, ...).
///
/// Backends own only the transport; message text comes from the shared renderer.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Deliver one event. `timestamp` is the shift start for
    /// `UpcomingShift` and the detection time otherwise.
    async fn deliver(&self, event: ShiftEvent, timestamp: DateTime<Utc>) -> Result<()>;

    /// Announce process start/stop. Backends without lifecycle support do nothing.
    async fn announce(&self, _lifecycle: Lifecycle) -> Result<()> {
        Ok(())
    }

    /// Whether `announce` actually sends anything.
    fn supports_lifecycle(&self) -> bool {
        false
    }
}
