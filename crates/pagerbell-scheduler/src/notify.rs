//! Notification rendering — one place that turns an event into message text.
//! Backends only decide how to ship a `Notification`, never what it says.

use chrono::{DateTime, Duration, Utc};
use pagerbell_core::types::{Lifecycle, ShiftEvent};
/// A rendered notification.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Title/summary.
    pub title: String,
    /// Body content.
    pub body: String,
    pub priority: NotifyPriority,
    /// Shift start for upcoming shifts, detection time otherwise.
    pub timestamp: DateTime<Utc>,
}

/// Notification priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyPriority {
    Low,
    Normal,
    Urgent,
}

/// Render a shift event. `now` is only used to compute "starts in ..." text.
pub fn render(event: ShiftEvent, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> Notification {
    let (title, body, priority) = match event {
        ShiftEvent::ShiftStarted => (
            "PagerDuty On-Call Shift Started",
            "🚨 Your PagerDuty on-call shift has started!".to_string(),
            NotifyPriority::Urgent,
        ),
        ShiftEvent::UpcomingShift => (
            "PagerDuty On-Call Shift Upcoming",
            format!(
                "⏰ Your PagerDuty on-call shift {}!",
                format_time_until(timestamp - now)
            ),
            NotifyPriority::Normal,
        ),
        ShiftEvent::ShiftEnded => (
            "PagerDuty On-Call Shift Ended",
            "✅ Your PagerDuty on-call shift has ended. Enjoy the downtime!".to_string(),
            NotifyPriority::Normal,
        ),
    };
    Notification {
        title: title.to_string(),
        body,
        priority,
        timestamp,
    }
}

/// Render a birth/will message.
pub fn render_lifecycle(lifecycle: Lifecycle) -> Notification {
    let (title, body) = match lifecycle {
        Lifecycle::Started => ("PagerDuty Notifier Started", "Birth message"),
        Lifecycle::Stopping => ("PagerDuty Notifier Stopped", "Will message"),
    };
    Notification {
        title: title.to_string(),
        body: body.to_string(),
        priority: NotifyPriority::Low,
        timestamp: Utc::now(),
    }
}

/// "starts in 2 hours and 5 minutes", "starts in 3 hours", "starts in 40 minutes",
/// or "starts soon" when under a minute (or already past).
pub fn format_time_until(remaining: Duration) -> String {
    let hours = remaining.num_hours();
    let minutes = remaining.num_minutes() % 60;
    match (hours > 0, minutes > 0) {
        (true, true) => format!("starts in {hours} hours and {minutes} minutes"),
        (true, false) => format!("starts in {hours} hours"),
        (false, true) => format!("starts in {minutes} minutes"),
        (false, false) => "starts soon".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_shift_started() {
        let now = Utc::now();
        let n = render(ShiftEvent::ShiftStarted, now, now);
        assert_eq!(n.title, "PagerDuty On-Call Shift Started");
        assert_eq!(n.body, "🚨 Your PagerDuty on-call shift has started!");
        assert_eq!(n.priority, NotifyPriority::Urgent);
    }

    #[test]
    fn test_render_upcoming_shift() {
        let now = Utc::now();
        let start = now + Duration::minutes(95);
        let n = render(ShiftEvent::UpcomingShift, start, now);
        assert_eq!(
            n.body,
            "⏰ Your PagerDuty on-call shift starts in 1 hours and 35 minutes!"
        );
        assert_eq!(n.priority, NotifyPriority::Normal);
        assert_eq!(n.timestamp, start);
    }

    #[test]
    fn test_render_shift_ended() {
        let now = Utc::now();
        let n = render(ShiftEvent::ShiftEnded, now, now);
        assert!(n.body.contains("has ended"));
        assert_eq!(n.title, "PagerDuty On-Call Shift Ended");
    }

    #[test]
    fn test_format_time_until() {
        assert_eq!(format_time_until(Duration::hours(2)), "starts in 2 hours");
        assert_eq!(format_time_until(Duration::minutes(45)), "starts in 45 minutes");
        assert_eq!(
            format_time_until(Duration::minutes(125)),
            "starts in 2 hours and 5 minutes"
        );
        assert_eq!(format_time_until(Duration::seconds(30)), "starts soon");
        assert_eq!(format_time_until(Duration::minutes(-5)), "starts soon");
    }

    #[test]
    fn test_render_lifecycle() {
        let birth = render_lifecycle(Lifecycle::Started);
        assert_eq!(birth.title, "PagerDuty Notifier Started");
        assert_eq!(birth.priority, NotifyPriority::Low);
        assert_eq!(render_lifecycle(Lifecycle::Stopping).body, "Will message");
    }
}
