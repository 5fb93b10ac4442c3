//! # Side-effect Dispatch
//!
//! Fire-and-forget notification intents triggered by state transitions.
//! Dispatch runs after the primary mutation has committed; every failure in
//! here is caught, logged, and recorded on the notification row. Nothing
//! propagates to the caller and nothing rolls back primary state.

pub mod dispatch;
pub mod recipient;

pub use dispatch::{ChannelSink, NotificationDispatcher, SinkError, TracingSink};
pub use recipient::{IntentKind, NotificationIntent, RecipientResolver, RecipientRule, ResolvedRecipient};
