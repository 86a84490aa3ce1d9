//! On-call source trait — where schedule data comes from.

use async_trait::async_trait;
use chrono::Duration;

use crate::error::Result;
use crate::types::UpcomingShift;

/// Answers "is this subject on call?" against an external schedule.
///
/// Implementations report every failure as `PagerbellError::SourceQuery`.
#[async_trait]
pub trait OnCallSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Whether `subject` is on call right now.
    async fn is_on_call(&self, subject: &str) -> Result<bool>;

    /// The earliest shift for `subject` starting within `lookahead` from now.
    async fn upcoming_shift(
        &self,
        subject: &str,
        lookahead: Duration,
    ) -> Result<Option<UpcomingShift>>;
}
