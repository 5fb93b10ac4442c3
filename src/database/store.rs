//! # Inspection Store Trait
//!
//! Async persistence contract consumed by the lifecycle, reconciler, and
//! assignment managers. Each method is a single atomic store operation;
//! multi-step sequences that must be atomic are expressed as one method
//! (notably [`InspectionStore::supersede_and_create_appointment`]) so an
//! implementation can wrap them in a transaction or a critical section.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    Appointment, CallLog, InspectionOrder, InspectionQueueEntry, IntermediaryAccount,
    NewAppointment, NewCallLog, NewInspectionOrder, NewNotification, NewQueueEntry, Notification,
    NotificationStatus,
};
use crate::state_machine::{AppointmentStatus, OrderStatus};

/// Result of an atomic supersession: the created appointment plus every row
/// it tombstoned.
#[derive(Debug, Clone)]
pub struct SupersessionOutcome {
    pub created: Appointment,
    pub superseded: Vec<Appointment>,
}

#[async_trait]
pub trait InspectionStore: Send + Sync {
    // ---- orders ----

    async fn create_order(&self, new_order: NewInspectionOrder) -> Result<InspectionOrder>;

    /// Find an order by id; tombstoned rows are not returned.
    async fn find_order(&self, order_id: i64) -> Result<Option<InspectionOrder>>;

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<InspectionOrder>;

    /// Unconditionally set or clear the assigned agent.
    async fn update_order_agent(
        &self,
        order_id: i64,
        agent_id: Option<i64>,
    ) -> Result<InspectionOrder>;

    // ---- appointments ----

    async fn find_appointment(&self, appointment_id: i64) -> Result<Option<Appointment>>;

    /// All non-tombstoned appointments for an order. Under the single-active
    /// invariant this returns at most one row, but callers must tolerate more
    /// while a supersession is being repaired.
    async fn active_appointments_for_order(&self, order_id: i64) -> Result<Vec<Appointment>>;

    /// All non-tombstoned appointments across orders, for the sede calendar.
    async fn active_appointments(&self) -> Result<Vec<Appointment>>;

    /// Atomically tombstone every active appointment for the order and create
    /// the replacement. The replacement inherits the superseded rows' session
    /// lineage in `previous_session_ids`; when `new.is_retry` is set the
    /// retry counter continues from the superseded row.
    async fn supersede_and_create_appointment(
        &self,
        new: NewAppointment,
    ) -> Result<SupersessionOutcome>;

    /// Move an appointment to a new status, stamping the status's transition
    /// timestamp column when it has one.
    async fn update_appointment_status(
        &self,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> Result<Appointment>;

    // ---- queue entries ----

    async fn create_queue_entry(&self, new_entry: NewQueueEntry) -> Result<InspectionQueueEntry>;

    /// Active (non-tombstoned, non-completed) queue entries, unordered; the
    /// reconciler owns ordering.
    async fn active_queue_entries(&self) -> Result<Vec<InspectionQueueEntry>>;

    /// The order's active queue entry, if one exists.
    async fn queue_entry_for_order(&self, order_id: i64) -> Result<Option<InspectionQueueEntry>>;

    /// Transition the order's queue entry to EnProceso, recording the
    /// inspector and the start time. Returns None when the order has no
    /// active queue entry.
    async fn mark_queue_in_progress(
        &self,
        order_id: i64,
        inspector_id: i64,
        started_at: DateTime<Utc>,
    ) -> Result<Option<InspectionQueueEntry>>;

    /// Transition the order's queue entry to Completada, stamping the end
    /// time. Returns None when the order has no active queue entry.
    async fn mark_queue_completed(
        &self,
        order_id: i64,
        finished_at: DateTime<Utc>,
    ) -> Result<Option<InspectionQueueEntry>>;

    // ---- call logs ----

    async fn append_call_log(&self, new_log: NewCallLog) -> Result<CallLog>;

    // ---- notifications ----

    async fn create_notification(&self, new_notification: NewNotification) -> Result<Notification>;

    async fn update_notification_status(
        &self,
        notification_id: i64,
        status: NotificationStatus,
    ) -> Result<Notification>;

    // ---- intermediary accounts ----

    /// Active intermediary account by stored key, for recipient resolution.
    async fn find_active_intermediary(&self, key: &str) -> Result<Option<IntermediaryAccount>>;
}
