//! # In-memory Store
//!
//! Lock-guarded table map implementing [`InspectionStore`]. Backs the test
//! suite and embedded development setups; every trait method runs inside one
//! critical section, so the atomicity contract of
//! `supersede_and_create_appointment` holds trivially.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{CitasError, Result};
use crate::models::{
    Appointment, CallLog, InspectionOrder, InspectionQueueEntry, IntermediaryAccount,
    NewAppointment, NewCallLog, NewInspectionOrder, NewNotification, NewQueueEntry, Notification,
    NotificationStatus,
};
use crate::state_machine::{AppointmentStatus, OrderStatus, QueueState, StatusInternal};

use super::store::{InspectionStore, SupersessionOutcome};

#[derive(Debug, Default)]
struct Tables {
    orders: HashMap<i64, InspectionOrder>,
    appointments: HashMap<i64, Appointment>,
    queue_entries: HashMap<i64, InspectionQueueEntry>,
    call_logs: Vec<CallLog>,
    notifications: HashMap<i64, Notification>,
    intermediaries: HashMap<String, IntermediaryAccount>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an intermediary account for recipient-resolution lookups.
    pub fn insert_intermediary(&self, account: IntermediaryAccount) {
        let mut tables = self.tables.lock();
        tables.intermediaries.insert(account.key.clone(), account);
    }

    /// Insert a fully-formed appointment row, bypassing supersession. Test
    /// support for timestamp-sensitive reconciler scenarios.
    pub fn insert_appointment_raw(&self, appointment: Appointment) {
        let mut tables = self.tables.lock();
        tables.next_id = tables.next_id.max(appointment.id);
        tables.appointments.insert(appointment.id, appointment);
    }

    /// Insert a fully-formed queue entry row. Test support, as above.
    pub fn insert_queue_entry_raw(&self, entry: InspectionQueueEntry) {
        let mut tables = self.tables.lock();
        tables.next_id = tables.next_id.max(entry.id);
        tables.queue_entries.insert(entry.id, entry);
    }

    /// Every notification row, in creation order. Test support.
    pub fn notifications_snapshot(&self) -> Vec<Notification> {
        let tables = self.tables.lock();
        let mut rows: Vec<_> = tables.notifications.values().cloned().collect();
        rows.sort_by_key(|n| n.id);
        rows
    }

    /// Every appointment row including tombstones, in creation order. Test
    /// support for supersession assertions.
    pub fn appointments_snapshot(&self) -> Vec<Appointment> {
        let tables = self.tables.lock();
        let mut rows: Vec<_> = tables.appointments.values().cloned().collect();
        rows.sort_by_key(|a| a.id);
        rows
    }
}

#[async_trait]
impl InspectionStore for MemoryStore {
    async fn create_order(&self, new_order: NewInspectionOrder) -> Result<InspectionOrder> {
        let mut tables = self.tables.lock();
        let now = Utc::now();
        let order = InspectionOrder {
            id: tables.next_id(),
            order_number: new_order.order_number,
            client_name: new_order.client_name,
            client_email: new_order.client_email,
            client_phone: new_order.client_phone,
            vehicle_plate: new_order.vehicle_plate,
            vehicle_brand: new_order.vehicle_brand,
            vehicle_model: new_order.vehicle_model,
            status: OrderStatus::Created,
            status_internal: StatusInternal::None,
            assigned_agent_id: None,
            source: new_order.source,
            intermediary_key: new_order.intermediary_key,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_order(&self, order_id: i64) -> Result<Option<InspectionOrder>> {
        let tables = self.tables.lock();
        Ok(tables
            .orders
            .get(&order_id)
            .filter(|o| o.deleted_at.is_none())
            .cloned())
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<InspectionOrder> {
        let mut tables = self.tables.lock();
        let order = tables
            .orders
            .get_mut(&order_id)
            .filter(|o| o.deleted_at.is_none())
            .ok_or_else(|| CitasError::NotFoundError(format!("order {order_id}")))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn update_order_agent(
        &self,
        order_id: i64,
        agent_id: Option<i64>,
    ) -> Result<InspectionOrder> {
        let mut tables = self.tables.lock();
        let order = tables
            .orders
            .get_mut(&order_id)
            .filter(|o| o.deleted_at.is_none())
            .ok_or_else(|| CitasError::NotFoundError(format!("order {order_id}")))?;
        order.assigned_agent_id = agent_id;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn find_appointment(&self, appointment_id: i64) -> Result<Option<Appointment>> {
        let tables = self.tables.lock();
        Ok(tables.appointments.get(&appointment_id).cloned())
    }

    async fn active_appointments_for_order(&self, order_id: i64) -> Result<Vec<Appointment>> {
        let tables = self.tables.lock();
        Ok(tables
            .appointments
            .values()
            .filter(|a| a.order_id == order_id && a.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn active_appointments(&self) -> Result<Vec<Appointment>> {
        let tables = self.tables.lock();
        Ok(tables
            .appointments
            .values()
            .filter(|a| a.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn supersede_and_create_appointment(
        &self,
        new: NewAppointment,
    ) -> Result<SupersessionOutcome> {
        let mut tables = self.tables.lock();
        let now = Utc::now();

        let superseded_ids: Vec<i64> = tables
            .appointments
            .values()
            .filter(|a| a.order_id == new.order_id && a.deleted_at.is_none())
            .map(|a| a.id)
            .collect();

        let mut superseded = Vec::with_capacity(superseded_ids.len());
        let mut lineage: Vec<Uuid> = Vec::new();
        let mut prior_retry_count = 0;
        for id in &superseded_ids {
            let Some(appointment) = tables.appointments.get_mut(id) else {
                continue;
            };
            appointment.deleted_at = Some(now);
            appointment.updated_at = now;
            lineage.extend(appointment.previous_session_ids.iter().copied());
            lineage.push(appointment.session_id);
            prior_retry_count = prior_retry_count.max(appointment.retry_count);
            superseded.push(appointment.clone());
        }

        let status = new.status;
        let created = Appointment {
            id: tables.next_id(),
            order_id: new.order_id,
            modality: new.modality,
            session_id: Uuid::new_v4(),
            status,
            scheduled_at: new.scheduled_at,
            sede_id: new.sede_id,
            inspector_id: new.inspector_id,
            call_log_id: new.call_log_id,
            assigned_at: (status == AppointmentStatus::Assigned).then_some(now),
            sent_at: None,
            delivered_at: None,
            read_at: None,
            completed_at: None,
            failed_at: None,
            retry_count: if new.is_retry { prior_retry_count + 1 } else { 0 },
            is_retry: new.is_retry,
            retry_reason: new.retry_reason,
            retried_at: new.is_retry.then_some(now),
            previous_session_ids: lineage,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.appointments.insert(created.id, created.clone());

        Ok(SupersessionOutcome { created, superseded })
    }

    async fn update_appointment_status(
        &self,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> Result<Appointment> {
        let mut tables = self.tables.lock();
        let now = Utc::now();
        let appointment = tables
            .appointments
            .get_mut(&appointment_id)
            .filter(|a| a.deleted_at.is_none())
            .ok_or_else(|| CitasError::NotFoundError(format!("appointment {appointment_id}")))?;
        appointment.status = status;
        appointment.updated_at = now;
        match status {
            AppointmentStatus::Assigned => appointment.assigned_at = Some(now),
            AppointmentStatus::Sent => appointment.sent_at = Some(now),
            AppointmentStatus::Delivered => appointment.delivered_at = Some(now),
            AppointmentStatus::Read => appointment.read_at = Some(now),
            AppointmentStatus::Completed => appointment.completed_at = Some(now),
            AppointmentStatus::Failed => appointment.failed_at = Some(now),
            _ => {}
        }
        Ok(appointment.clone())
    }

    async fn create_queue_entry(&self, new_entry: NewQueueEntry) -> Result<InspectionQueueEntry> {
        let mut tables = self.tables.lock();
        let now = Utc::now();
        let entry = InspectionQueueEntry {
            id: tables.next_id(),
            order_id: new_entry.order_id,
            estado: QueueState::EnCola,
            prioridad: new_entry.prioridad,
            tiempo_ingreso: new_entry.tiempo_ingreso.unwrap_or(now),
            tiempo_inicio: None,
            tiempo_fin: None,
            inspector_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.queue_entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn active_queue_entries(&self) -> Result<Vec<InspectionQueueEntry>> {
        let tables = self.tables.lock();
        Ok(tables
            .queue_entries
            .values()
            .filter(|e| e.is_active())
            .cloned()
            .collect())
    }

    async fn queue_entry_for_order(&self, order_id: i64) -> Result<Option<InspectionQueueEntry>> {
        let tables = self.tables.lock();
        Ok(tables
            .queue_entries
            .values()
            .find(|e| e.order_id == order_id && e.is_active())
            .cloned())
    }

    async fn mark_queue_in_progress(
        &self,
        order_id: i64,
        inspector_id: i64,
        started_at: DateTime<Utc>,
    ) -> Result<Option<InspectionQueueEntry>> {
        let mut tables = self.tables.lock();
        let entry = tables
            .queue_entries
            .values_mut()
            .find(|e| e.order_id == order_id && e.is_active());
        Ok(entry.map(|e| {
            e.estado = QueueState::EnProceso;
            e.inspector_id = Some(inspector_id);
            e.tiempo_inicio = Some(started_at);
            e.updated_at = started_at;
            e.clone()
        }))
    }

    async fn mark_queue_completed(
        &self,
        order_id: i64,
        finished_at: DateTime<Utc>,
    ) -> Result<Option<InspectionQueueEntry>> {
        let mut tables = self.tables.lock();
        let entry = tables
            .queue_entries
            .values_mut()
            .find(|e| e.order_id == order_id && e.is_active());
        Ok(entry.map(|e| {
            e.estado = QueueState::Completada;
            e.tiempo_fin = Some(finished_at);
            e.updated_at = finished_at;
            e.clone()
        }))
    }

    async fn append_call_log(&self, new_log: NewCallLog) -> Result<CallLog> {
        let mut tables = self.tables.lock();
        let log = CallLog {
            id: tables.next_id(),
            order_id: new_log.order_id,
            agent_id: new_log.agent_id,
            status_code: new_log.status.code,
            creates_schedule: new_log.status.creates_schedule,
            comments: new_log.comments,
            created_at: Utc::now(),
        };
        tables.call_logs.push(log.clone());
        Ok(log)
    }

    async fn create_notification(&self, new_notification: NewNotification) -> Result<Notification> {
        let mut tables = self.tables.lock();
        let now = Utc::now();
        let notification = Notification {
            id: tables.next_id(),
            order_id: new_notification.order_id,
            recipient: new_notification.recipient,
            channel: new_notification.channel,
            content: new_notification.content,
            priority: new_notification.priority,
            status: new_notification.status,
            metadata: new_notification.metadata,
            created_at: now,
            updated_at: now,
        };
        tables
            .notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn update_notification_status(
        &self,
        notification_id: i64,
        status: NotificationStatus,
    ) -> Result<Notification> {
        let mut tables = self.tables.lock();
        let notification = tables
            .notifications
            .get_mut(&notification_id)
            .ok_or_else(|| CitasError::NotFoundError(format!("notification {notification_id}")))?;
        notification.status = status;
        notification.updated_at = Utc::now();
        Ok(notification.clone())
    }

    async fn find_active_intermediary(&self, key: &str) -> Result<Option<IntermediaryAccount>> {
        let tables = self.tables.lock();
        Ok(tables
            .intermediaries
            .get(key)
            .filter(|a| a.active)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::Modality;

    #[tokio::test]
    async fn test_supersession_tombstones_and_carries_lineage() {
        let store = MemoryStore::new();
        let order = store
            .create_order(NewInspectionOrder {
                order_number: "ORD-1".to_string(),
                client_name: "Ana".to_string(),
                client_email: None,
                client_phone: None,
                vehicle_plate: "AAA-111".to_string(),
                vehicle_brand: None,
                vehicle_model: None,
                source: crate::state_machine::OrderSource::Direct,
                intermediary_key: None,
            })
            .await
            .unwrap();

        let first = store
            .supersede_and_create_appointment(NewAppointment::for_order(
                order.id,
                Modality::InSede,
            ))
            .await
            .unwrap();
        assert!(first.superseded.is_empty());

        let second = store
            .supersede_and_create_appointment(NewAppointment::for_order(
                order.id,
                Modality::Virtual,
            ))
            .await
            .unwrap();
        assert_eq!(second.superseded.len(), 1);
        assert_eq!(
            second.created.previous_session_ids,
            vec![first.created.session_id]
        );

        let active = store
            .active_appointments_for_order(order.id)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.created.id);
    }

    #[tokio::test]
    async fn test_retry_counter_continues_across_supersession() {
        let store = MemoryStore::new();
        let mut new = NewAppointment::for_order(1, Modality::Virtual);
        store
            .supersede_and_create_appointment(new.clone())
            .await
            .unwrap();

        new.is_retry = true;
        new.retry_reason = Some("client unreachable".to_string());
        let retried = store
            .supersede_and_create_appointment(new.clone())
            .await
            .unwrap();
        assert_eq!(retried.created.retry_count, 1);
        assert!(retried.created.retried_at.is_some());

        let retried_again = store
            .supersede_and_create_appointment(new)
            .await
            .unwrap();
        assert_eq!(retried_again.created.retry_count, 2);
    }

    #[tokio::test]
    async fn test_queue_entry_progression() {
        let store = MemoryStore::new();
        store
            .create_queue_entry(NewQueueEntry {
                order_id: 9,
                prioridad: 2,
                tiempo_ingreso: None,
            })
            .await
            .unwrap();

        let started = store
            .mark_queue_in_progress(9, 77, Utc::now())
            .await
            .unwrap()
            .expect("entry should exist");
        assert_eq!(started.estado, QueueState::EnProceso);
        assert_eq!(started.inspector_id, Some(77));
        assert!(started.tiempo_inicio.is_some());

        let finished = store
            .mark_queue_completed(9, Utc::now())
            .await
            .unwrap()
            .expect("entry should exist");
        assert_eq!(finished.estado, QueueState::Completada);
        assert!(store.queue_entry_for_order(9).await.unwrap().is_none());
    }
}
