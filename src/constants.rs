//! # System Constants
//!
//! Realtime event names and status groupings shared across the coordination
//! engine. Event name strings are part of the wire contract with connected
//! operator consoles and must not be renamed.

// Re-export state types for convenience
pub use crate::state_machine::{AppointmentStatus, Modality, OrderStatus, QueueState};

/// Realtime event names emitted by the coordination engine.
///
/// Consumers match on these exact strings; the mixed naming convention
/// (snake_case and camelCase) is frozen for compatibility.
pub mod events {
    pub const ORDER_ASSIGNED: &str = "order_assigned";
    pub const ORDER_REMOVED: &str = "order_removed";
    pub const ORDER_STATUS_UPDATED: &str = "order_status_updated";
    pub const CALL_LOGGED: &str = "call_logged";
    pub const SEDE_APPOINTMENT_CREATED: &str = "sedeAppointmentCreated";
    pub const INSPECTOR_ASSIGNED: &str = "inspectorAssigned";
    pub const QUEUE_STATUS_UPDATE: &str = "queueStatusUpdate";
}

/// Well-known room names and prefixes for the fan-out layer.
pub mod rooms {
    /// Identity-scoped room, one per principal.
    pub const USER_PREFIX: &str = "user:";
    /// Role-scoped room, one per role.
    pub const ROLE_PREFIX: &str = "role:";
    /// Shared ad-hoc room joined by virtual-inspection coordinators.
    pub const COORDINATORS: &str = "coordinators";
}

/// Status groupings used by the reconciler and views.
pub mod status_groups {
    use crate::state_machine::{AppointmentStatus, OrderStatus};

    /// Appointment statuses excluded from the live operational views: the
    /// work is either finished or already handed off to another workflow.
    pub const QUEUE_TERMINAL_STATUSES: &[AppointmentStatus] = &[
        AppointmentStatus::Completed,
        AppointmentStatus::Failed,
        AppointmentStatus::IneffectiveNoRetry,
        AppointmentStatus::CallFinished,
        AppointmentStatus::RevisionSupervisor,
        AppointmentStatus::Assigned,
        AppointmentStatus::Sent,
    ];

    /// Order statuses that remove an order's appointments from the sede
    /// calendar view.
    pub const EXCLUDED_ORDER_STATUSES: &[OrderStatus] = &[
        OrderStatus::Finalized,
        OrderStatus::Cancelled,
        OrderStatus::Expired,
    ];

    pub fn is_queue_terminal(status: AppointmentStatus) -> bool {
        QUEUE_TERMINAL_STATUSES.contains(&status)
    }

    pub fn is_excluded_order_status(status: OrderStatus) -> bool {
        EXCLUDED_ORDER_STATUSES.contains(&status)
    }
}
