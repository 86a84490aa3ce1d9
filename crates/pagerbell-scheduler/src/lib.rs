//! # Pagerbell Scheduler
//!
//! The on-call state machine and the loop that drives it.
//!
//! ## Design Principles
//! - One tiny JSON file for state — survives restarts, easy to inspect
//! - Pure decision functions — no I/O in the engine
//! - Tokio timers only — cycles never overlap
//! - Every failure except a bad state file degrades to a log line
//!
//! ## Architecture
//! ```text
//! Poller (tokio interval)
//!   ├── OnCallSource: is_on_call? next shift?
//!   ├── engine: OFF_CALL → ON_CALL        → ShiftStarted
//!   │           ON_CALL  → OFF_CALL       → ShiftEnded (opt-in)
//!   │           shift within window, 24h cooldown → UpcomingShift
//!   ├── Notifier: deliver(event, timestamp)
//!   └── StateStore: save { was_on_call, last_advance_notification_sent }
//! ```

pub mod engine;
pub mod notify;
pub mod poller;
pub mod store;

pub use notify::{Notification, NotifyPriority, render, render_lifecycle};
pub use poller::{CycleReport, Poller, PollerConfig};
pub use store::{PersistedState, StateStore};
