//! # Coordination Engine
//!
//! The managers that drive the appointment / inspection-queue core:
//!
//! - [`AppointmentLifecycleManager`]: creates and supersedes appointments,
//!   claims virtual inspections, logs calls; owns the per-order lock that
//!   keeps the single-active-appointment invariant under concurrency.
//! - [`QueueReconciler`]: derives the two operator-facing views by merging
//!   queue entries with active appointments; pure projections, recomputed on
//!   every request, never persisted.
//! - [`AssignmentManager`]: (re)assigns contact agents with symmetric
//!   notify-old/notify-new semantics.
//!
//! Control flow: an inbound action mutates the data model, then the
//! reconciler re-derives views on demand while realtime events and
//! notification intents fan out best-effort. The downstream legs are
//! independently failure-isolated from the primary mutation.

pub mod assignment;
pub mod lifecycle;
pub mod reconciler;

pub use assignment::AssignmentManager;
pub use lifecycle::{Actor, AppointmentLifecycleManager, CallSchedule, CreateAppointment, LogCall};
pub use reconciler::{EffectiveStatus, QueueReconciler, SedeAppointmentItem, VirtualQueueItem};
