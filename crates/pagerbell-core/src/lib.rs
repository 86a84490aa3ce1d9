//! # Pagerbell Core
//!
//! Shared foundation for the Pagerbell crates: the error taxonomy, the
//! configuration system, the event types, and the two collaborator traits
//! the poller talks to.
//!
//! ```text
//! OnCallSource ──▶ Poller ──▶ Notifier
//!   (PagerDuty)      │          (webhook / ntfy / Pushover)
//!                    ▼
//!                StateStore
//! ```

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{NotificationBackend, PagerbellConfig};
pub use error::{PagerbellError, Result};
pub use traits::{Notifier, OnCallSource};
pub use types::{Lifecycle, ShiftEvent, UpcomingShift};
