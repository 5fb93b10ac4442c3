//! # Data Model Layer
//!
//! Persistent entities of the inspection coordination engine. Row structs are
//! plain typed data; persistence lives behind [`crate::database::InspectionStore`].

pub mod core;

pub use core::appointment::{Appointment, NewAppointment};
pub use core::intermediary_account::IntermediaryAccount;
pub use core::call_log::{CallLog, CallStatus, NewCallLog};
pub use core::inspection_order::{InspectionOrder, NewInspectionOrder, OrderSnapshot};
pub use core::notification::{Channel, NewNotification, Notification, NotificationStatus};
pub use core::queue_entry::{InspectionQueueEntry, NewQueueEntry};
