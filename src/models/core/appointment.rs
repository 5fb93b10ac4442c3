//! # Appointment Model
//!
//! A scheduled inspection event: exactly one order, one modality, one session.
//!
//! ## Supersession
//!
//! At most one non-tombstoned appointment exists per order at any externally
//! observable instant. Replacing an appointment tombstones the prior row and
//! records its session id in `previous_session_ids` on the replacement, so the
//! full session lineage of an order survives retries.
//!
//! ## Transition timestamps
//!
//! One timestamp column per delivery transition (`assigned_at`, `sent_at`,
//! `delivered_at`, `read_at`, `completed_at`, `failed_at`); the store stamps
//! the matching column when a status is entered, see
//! [`AppointmentStatus::timestamp_field`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state_machine::{AppointmentStatus, Modality};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub order_id: i64,
    pub modality: Modality,
    /// Globally-unique session identifier, fresh per appointment.
    pub session_id: Uuid,
    pub status: AppointmentStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sede_id: Option<i64>,
    pub inspector_id: Option<i64>,
    /// Set once the appointment is folded into a contact-center workflow.
    pub call_log_id: Option<i64>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    // Retry bookkeeping. Written on supersession of a failed appointment;
    // no scheduler in this crate reads them, retries are externally driven.
    pub retry_count: i32,
    pub is_retry: bool,
    pub retry_reason: Option<String>,
    pub retried_at: Option<DateTime<Utc>>,
    /// Session ids of every appointment this one superseded, oldest first.
    pub previous_session_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// New appointment for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub order_id: i64,
    pub modality: Modality,
    pub status: AppointmentStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sede_id: Option<i64>,
    pub inspector_id: Option<i64>,
    pub call_log_id: Option<i64>,
    pub is_retry: bool,
    pub retry_reason: Option<String>,
}

impl NewAppointment {
    /// Baseline appointment for an order, defaulting to Pending with no
    /// schedule attached.
    pub fn for_order(order_id: i64, modality: Modality) -> Self {
        Self {
            order_id,
            modality,
            status: AppointmentStatus::Pending,
            scheduled_at: None,
            sede_id: None,
            inspector_id: None,
            call_log_id: None,
            is_retry: false,
            retry_reason: None,
        }
    }
}

impl Appointment {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Timestamp of the transition into the current status, when stamped.
    pub fn current_transition_at(&self) -> Option<DateTime<Utc>> {
        match self.status {
            AppointmentStatus::Assigned => self.assigned_at,
            AppointmentStatus::Sent => self.sent_at,
            AppointmentStatus::Delivered => self.delivered_at,
            AppointmentStatus::Read => self.read_at,
            AppointmentStatus::Completed => self.completed_at,
            AppointmentStatus::Failed => self.failed_at,
            _ => None,
        }
    }
}
