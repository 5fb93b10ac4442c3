//! # Queue/Appointment Reconciler
//!
//! An order waiting for virtual inspection lives in two places at once: its
//! queue entry and, possibly, an active appointment. Neither row alone is
//! the operational truth. The reconciler merges the two into the status an
//! operator should act on, and produces the two read-only views built from
//! that merge.
//!
//! Both views are pure projections: recomputed on every request, never
//! persisted, and reading them never mutates state.

use std::sync::Arc;

use crate::constants::status_groups;
use crate::database::InspectionStore;
use crate::error::Result;
use crate::models::{Appointment, InspectionOrder, InspectionQueueEntry};
use crate::state_machine::{AppointmentStatus, QueueState};

/// The status an operator should see for a queued order, after reconciling
/// its queue entry with its active appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveStatus {
    /// The queue entry's own estado is authoritative.
    Queue(QueueState),
    /// The joined appointment's status is authoritative.
    Appointment(AppointmentStatus),
}

/// Reconcile a queue entry with its order's active appointment.
///
/// An appointment created before the queue entry belongs to a previous
/// cycle of the order and is stale for queue purposes: the entry's own
/// estado wins. Otherwise the appointment is the fresher fact and its
/// status is surfaced.
pub fn effective_status(
    entry: &InspectionQueueEntry,
    appointment: Option<&Appointment>,
) -> EffectiveStatus {
    match appointment {
        Some(appointment) if appointment.created_at >= entry.created_at => {
            EffectiveStatus::Appointment(appointment.status)
        }
        _ => EffectiveStatus::Queue(entry.estado),
    }
}

/// Whether an effective status removes the entry from the live queue view:
/// the inspection is done or already handed off to another workflow.
pub fn is_handed_off(status: EffectiveStatus) -> bool {
    match status {
        EffectiveStatus::Appointment(status) => status_groups::is_queue_terminal(status),
        EffectiveStatus::Queue(_) => false,
    }
}

/// One row of the virtual-queue view.
#[derive(Debug, Clone)]
pub struct VirtualQueueItem {
    pub entry: InspectionQueueEntry,
    pub appointment: Option<Appointment>,
    pub effective_status: EffectiveStatus,
}

/// One row of the sede calendar view.
#[derive(Debug, Clone)]
pub struct SedeAppointmentItem {
    pub appointment: Appointment,
    pub order: InspectionOrder,
}

#[derive(Clone)]
pub struct QueueReconciler {
    store: Arc<dyn InspectionStore>,
}

impl QueueReconciler {
    pub fn new(store: Arc<dyn InspectionStore>) -> Self {
        Self { store }
    }

    /// The live virtual-inspection queue: active entries ordered by
    /// prioridad descending, then strict FIFO within a priority band, each
    /// joined to its order's active appointment and filtered by the
    /// effective-status terminal set.
    pub async fn get_virtual_inspections(&self) -> Result<Vec<VirtualQueueItem>> {
        let mut entries = self.store.active_queue_entries().await?;
        entries.sort_by(|a, b| {
            b.prioridad
                .cmp(&a.prioridad)
                .then(a.tiempo_ingreso.cmp(&b.tiempo_ingreso))
        });

        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            let appointment = self
                .store
                .active_appointments_for_order(entry.order_id)
                .await?
                .into_iter()
                .next();
            let effective = effective_status(&entry, appointment.as_ref());
            if is_handed_off(effective) {
                continue;
            }
            items.push(VirtualQueueItem {
                entry,
                appointment,
                effective_status: effective,
            });
        }
        Ok(items)
    }

    /// The sede calendar: active appointments not yet folded into a
    /// contact-center workflow, for orders still in flight, ordered by
    /// scheduled date ascending (unscheduled rows last).
    pub async fn get_sede_appointments(&self) -> Result<Vec<SedeAppointmentItem>> {
        let appointments = self.store.active_appointments().await?;

        let mut items = Vec::new();
        for appointment in appointments {
            if appointment.call_log_id.is_some() {
                continue;
            }
            if status_groups::is_queue_terminal(appointment.status) {
                continue;
            }
            let Some(order) = self.store.find_order(appointment.order_id).await? else {
                continue;
            };
            if status_groups::is_excluded_order_status(order.status) {
                continue;
            }
            items.push(SedeAppointmentItem { appointment, order });
        }

        items.sort_by(|a, b| match (a.appointment.scheduled_at, b.appointment.scheduled_at) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.appointment.created_at.cmp(&b.appointment.created_at),
        });
        Ok(items)
    }
}
