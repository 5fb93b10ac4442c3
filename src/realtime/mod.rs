//! # Real-time Fan-out Layer
//!
//! Connection registry, room membership, and delivery primitives for pushing
//! state-change events to connected operator sessions.
//!
//! Delivery is at-most-once and best-effort, with no persistence or backlog:
//! a disconnected principal simply misses the event. The operational views in
//! [`crate::orchestration::reconciler`] are independently re-fetchable, so
//! every event here is an invalidation hint that should trigger a refetch,
//! never the sole carrier of state.

pub mod events;
pub mod hub;
pub mod registry;

pub use events::RealtimeEvent;
pub use hub::RealtimeHub;
pub use registry::{ConnectionRegistry, Principal, SessionId};
