//! Collaborator interfaces consumed by the poller.

pub mod notifier;
pub mod source;

pub use notifier::Notifier;
pub use source::OnCallSource;
