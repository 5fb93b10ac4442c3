#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Citas Core
//!
//! Rust core of the vehicle-inspection service-request system: the
//! appointment / inspection-queue coordination engine.
//!
//! ## Overview
//!
//! An inspection order runs on two parallel tracks: a priority queue for
//! virtual inspections and a calendar of in-person appointments. This crate
//! reconciles the two into one consistent effective state, enforces the
//! single-active-appointment invariant per order under supersession and
//! retry, drives transactional side effects (notifications) without letting
//! their failure corrupt primary state, and fans state changes out in real
//! time to connected operator sessions.
//!
//! ## Module Organization
//!
//! - [`models`] - Persistent entities: orders, appointments, queue entries,
//!   call logs, notifications
//! - [`database`] - The store seam: Postgres and in-memory implementations
//! - [`state_machine`] - Status enums and transition metadata
//! - [`orchestration`] - Lifecycle, reconciler, and assignment managers
//! - [`realtime`] - Connection registry, rooms, and delivery primitives
//! - [`notifications`] - Recipient resolution and best-effort dispatch
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use citas_core::config::CitasConfig;
//! use citas_core::database::{InspectionStore, MemoryStore};
//! use citas_core::notifications::{NotificationDispatcher, TracingSink};
//! use citas_core::orchestration::{AppointmentLifecycleManager, QueueReconciler};
//! use citas_core::realtime::RealtimeHub;
//!
//! # async fn example() -> citas_core::error::Result<()> {
//! let config = CitasConfig::from_env()?;
//! let store: Arc<dyn InspectionStore> = Arc::new(MemoryStore::new());
//! let hub = RealtimeHub::with_capacity(config.realtime_channel_capacity);
//! let dispatcher = Arc::new(NotificationDispatcher::new(
//!     store.clone(),
//!     Arc::new(TracingSink),
//! ));
//!
//! let lifecycle =
//!     AppointmentLifecycleManager::new(store.clone(), hub.clone(), dispatcher, config);
//! let reconciler = QueueReconciler::new(store);
//!
//! let queue = reconciler.get_virtual_inspections().await?;
//! println!("{} orders waiting", queue.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod orchestration;
pub mod realtime;
pub mod state_machine;

pub use config::CitasConfig;
pub use constants::status_groups;
pub use database::{InspectionStore, MemoryStore, PgStore, SupersessionOutcome};
pub use error::{CitasError, Result};
pub use models::{
    Appointment, CallLog, CallStatus, Channel, InspectionOrder, InspectionQueueEntry,
    IntermediaryAccount, NewAppointment, NewCallLog, NewInspectionOrder, NewNotification,
    NewQueueEntry, Notification, NotificationStatus, OrderSnapshot,
};
pub use notifications::{
    ChannelSink, IntentKind, NotificationDispatcher, NotificationIntent, RecipientResolver,
    RecipientRule, SinkError, TracingSink,
};
pub use orchestration::{
    Actor, AppointmentLifecycleManager, AssignmentManager, CallSchedule, CreateAppointment,
    EffectiveStatus, LogCall, QueueReconciler, SedeAppointmentItem, VirtualQueueItem,
};
pub use realtime::{ConnectionRegistry, Principal, RealtimeEvent, RealtimeHub, SessionId};
pub use state_machine::{
    AppointmentStatus, Modality, OrderSource, OrderStatus, QueueState, StatusInternal,
};
