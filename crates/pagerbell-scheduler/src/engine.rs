//! Transition engine — pure decisions over (previous state, latest observation).
//!
//! No I/O happens here. The poller feeds in what the source reported and acts
//! on the answers; every function has an `_at` form taking an explicit `now`.
//!
//! ## Advance-notice dedup
//!
//! The source gives us no shift identifier, so "already warned about this
//! shift" is approximated by a 24-hour rolling cooldown on the last advance
//! notice. This holds as long as the subject's shifts start more than 24h
//! apart and the advance window is shorter than 24h: one cooldown can then
//! never span two distinct shifts. Rotations with shorter gaps will have the
//! second reminder suppressed. That is a known limitation, kept on purpose
//! until per-shift tracking is wanted.

use chrono::{DateTime, Duration, Utc};
use pagerbell_core::types::ShiftEvent;

use crate::store::PersistedState;

/// Minimum time between two advance notices, in seconds.
pub const ADVANCE_COOLDOWN_SECS: i64 = 24 * 60 * 60;

pub fn advance_cooldown() -> Duration {
    Duration::seconds(ADVANCE_COOLDOWN_SECS)
}

/// OFF_CALL → ON_CALL.
pub fn has_transition_to_on_call(previous: &PersistedState, currently_on_call: bool) -> bool {
    !previous.was_on_call && currently_on_call
}

/// ON_CALL → OFF_CALL.
pub fn has_transition_to_off_call(previous: &PersistedState, currently_on_call: bool) -> bool {
    previous.was_on_call && !currently_on_call
}

/// Whether to warn now about a shift starting at `shift_start`.
pub fn should_send_advance_notification(
    state: &PersistedState,
    shift_start: DateTime<Utc>,
    advance_window: Duration,
) -> bool {
    should_send_advance_notification_at(state, shift_start, advance_window, Utc::now())
}

pub fn should_send_advance_notification_at(
    state: &PersistedState,
    shift_start: DateTime<Utc>,
    advance_window: Duration,
    now: DateTime<Utc>,
) -> bool {
    if advance_window <= Duration::zero() {
        return false;
    }

    // Shift already started (stale data) or still too far out.
    let time_until_shift = shift_start - now;
    if time_until_shift <= Duration::zero() || time_until_shift > advance_window {
        return false;
    }

    match state.last_advance_notification_sent {
        Some(last) => now - last >= advance_cooldown(),
        None => true,
    }
}

/// Mark an advance notice as sent. In-memory only; the poller persists.
pub fn record_advance_notification_sent(state: &mut PersistedState) {
    record_advance_notification_sent_at(state, Utc::now());
}

pub fn record_advance_notification_sent_at(state: &mut PersistedState, now: DateTime<Utc>) {
    state.last_advance_notification_sent = Some(now);
}

/// Transition events implied by an observation, in delivery order.
/// `UpcomingShift` is not included: it depends on the source's shift window.
pub fn evaluate(
    previous: &PersistedState,
    currently_on_call: bool,
    notify_shift_ended: bool,
) -> Vec<ShiftEvent> {
    let mut events = Vec::new();
    if has_transition_to_on_call(previous, currently_on_call) {
        events.push(ShiftEvent::ShiftStarted);
    }
    if notify_shift_ended && has_transition_to_off_call(previous, currently_on_call) {
        events.push(ShiftEvent::ShiftEnded);
    }
    events
}
