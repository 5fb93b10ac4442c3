//! # Appointment Lifecycle Manager
//!
//! Creates and supersedes appointments, claims virtual inspections, records
//! call outcomes, and keeps the order's top-level status in step. Exactly
//! one non-tombstoned appointment exists per order after any successful
//! operation here.
//!
//! ## Concurrency
//!
//! The supersession sequence (load actives, tombstone, create) is atomic at
//! the store layer, and the wider read-validate-write flow of each operation
//! is serialized through a per-order async lock, so two concurrent calls for
//! the same order cannot both observe "no active appointment" and each
//! create one. Calls for different orders do not contend.
//!
//! ## Failure isolation
//!
//! Realtime events and notification intents fire only after the primary
//! mutation committed; their failures are logged and never surface to the
//! caller, and never roll the mutation back.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::CitasConfig;
use crate::constants::events;
use crate::database::InspectionStore;
use crate::error::{CitasError, Result};
use crate::models::{Appointment, CallLog, CallStatus, Channel, NewAppointment, NewCallLog};
use crate::notifications::{IntentKind, NotificationDispatcher, NotificationIntent, RecipientRule};
use crate::realtime::{RealtimeEvent, RealtimeHub};
use crate::state_machine::{AppointmentStatus, Modality, OrderStatus};

/// Who is performing a lifecycle operation. Contact agents may only act on
/// orders assigned to them; operators act on any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    ContactAgent(i64),
    Operator,
}

/// Request payload for [`AppointmentLifecycleManager::create_appointment`].
#[derive(Debug, Clone)]
pub struct CreateAppointment {
    pub order_id: i64,
    pub modality: Modality,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sede_id: Option<i64>,
    pub actor: Actor,
    /// Present when the appointment was agreed during a logged call.
    pub call_log_id: Option<i64>,
}

/// Schedule details captured during a call whose outcome creates one.
#[derive(Debug, Clone)]
pub struct CallSchedule {
    pub modality: Modality,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sede_id: Option<i64>,
}

/// Request payload for [`AppointmentLifecycleManager::log_call`].
#[derive(Debug, Clone)]
pub struct LogCall {
    pub order_id: i64,
    pub agent_id: i64,
    pub status: CallStatus,
    pub comments: Option<String>,
    pub schedule: Option<CallSchedule>,
}

pub struct AppointmentLifecycleManager {
    store: Arc<dyn InspectionStore>,
    hub: RealtimeHub,
    dispatcher: Arc<NotificationDispatcher>,
    config: CitasConfig,
    order_locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl AppointmentLifecycleManager {
    pub fn new(
        store: Arc<dyn InspectionStore>,
        hub: RealtimeHub,
        dispatcher: Arc<NotificationDispatcher>,
        config: CitasConfig,
    ) -> Self {
        Self {
            store,
            hub,
            dispatcher,
            config,
            order_locks: DashMap::new(),
        }
    }

    fn order_lock(&self, order_id: i64) -> Arc<Mutex<()>> {
        self.order_locks
            .entry(order_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Create (or replace) the appointment for an order.
    ///
    /// Any active appointment is superseded: tombstoned in the same atomic
    /// store operation that creates the replacement, which inherits the
    /// session lineage.
    pub async fn create_appointment(&self, request: CreateAppointment) -> Result<Appointment> {
        let lock = self.order_lock(request.order_id);
        let _guard = lock.lock().await;

        let order = self
            .store
            .find_order(request.order_id)
            .await?
            .ok_or_else(|| CitasError::NotFoundError(format!("order {}", request.order_id)))?;

        if let Actor::ContactAgent(agent_id) = request.actor {
            if order.assigned_agent_id != Some(agent_id) {
                return Err(CitasError::NotFoundError(format!(
                    "order {} is not assigned to agent {agent_id}",
                    request.order_id
                )));
            }
        }

        let outcome = self
            .store
            .supersede_and_create_appointment(NewAppointment {
                order_id: request.order_id,
                modality: request.modality,
                status: AppointmentStatus::Pending,
                scheduled_at: request.scheduled_at,
                sede_id: request.sede_id,
                inspector_id: None,
                call_log_id: request.call_log_id,
                is_retry: false,
                retry_reason: None,
            })
            .await?;

        if !outcome.superseded.is_empty() {
            info!(
                order_id = request.order_id,
                superseded = outcome.superseded.len(),
                "superseded prior appointment(s)"
            );
        }

        let order = self
            .store
            .update_order_status(request.order_id, OrderStatus::Scheduled)
            .await?;

        // Primary mutation is committed; everything below is best-effort.
        let snapshot = order.snapshot();
        let created = &outcome.created;

        self.hub.send_to_role(
            "coordinator",
            RealtimeEvent::for_order(
                events::SEDE_APPOINTMENT_CREATED,
                order.id,
                order.order_number.clone(),
                format!("Appointment created for order {}", order.order_number),
            )
            .with_snapshot(snapshot.clone()),
        );
        self.emit_order_status_updated(&order);

        self.dispatcher
            .dispatch(NotificationIntent {
                kind: IntentKind::AppointmentCreated,
                order_id: Some(order.id),
                rule: RecipientRule::OrderContact { order_id: order.id },
                channels: vec![Channel::Email, Channel::Sms],
                content: format!(
                    "Your inspection for plate {} has been scheduled",
                    order.vehicle_plate
                ),
                priority: 1,
                metadata: created
                    .scheduled_at
                    .map(|at| serde_json::json!({ "scheduled_at": at })),
            })
            .await;

        // At-home inspections additionally alert the operations list.
        if request.modality == Modality::AtHome {
            self.dispatcher
                .dispatch(NotificationIntent {
                    kind: IntentKind::OperationsAlert,
                    order_id: Some(order.id),
                    rule: RecipientRule::FixedAddress {
                        address: self.config.operations_list_address.clone(),
                    },
                    channels: vec![Channel::Email],
                    content: format!(
                        "At-home inspection scheduled for order {} (plate {})",
                        order.order_number, order.vehicle_plate
                    ),
                    priority: 2,
                    metadata: None,
                })
                .await;
        }

        Ok(outcome.created)
    }

    /// Idempotent claim of an order for virtual inspection.
    ///
    /// Supersedes any active appointment (so a second coordinator claiming
    /// the same order simply takes it over), creates a Virtual appointment
    /// already Assigned to the inspector, and moves the queue entry to
    /// EnProceso.
    pub async fn start_virtual_inspection(
        &self,
        order_id: i64,
        inspector_id: i64,
        sede_id: Option<i64>,
    ) -> Result<Appointment> {
        let lock = self.order_lock(order_id);
        let _guard = lock.lock().await;

        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| CitasError::NotFoundError(format!("order {order_id}")))?;

        let actives = self.store.active_appointments_for_order(order_id).await?;
        let retry_of = actives
            .iter()
            .find(|a| a.status.is_retryable())
            .map(|a| a.status);

        let outcome = self
            .store
            .supersede_and_create_appointment(NewAppointment {
                order_id,
                modality: Modality::Virtual,
                status: AppointmentStatus::Assigned,
                scheduled_at: None,
                sede_id,
                inspector_id: Some(inspector_id),
                call_log_id: None,
                is_retry: retry_of.is_some(),
                retry_reason: retry_of.map(|status| format!("superseded {status} session")),
            })
            .await?;

        let started_at = outcome.created.created_at;
        let queue_entry = self
            .store
            .mark_queue_in_progress(order_id, inspector_id, started_at)
            .await?;
        if queue_entry.is_none() {
            warn!(order_id, "virtual inspection started without a queue entry");
        }

        let order = self
            .store
            .update_order_status(order_id, OrderStatus::InInspection)
            .await?;

        self.hub.send_to_role(
            "coordinator",
            RealtimeEvent::for_order(
                events::INSPECTOR_ASSIGNED,
                order.id,
                order.order_number.clone(),
                format!(
                    "Inspector {inspector_id} took order {} for virtual inspection",
                    order.order_number
                ),
            ),
        );
        self.emit_queue_status_update(&order.order_number, order.id);

        Ok(outcome.created)
    }

    /// Drive the order's active appointment to a terminal outcome, closing
    /// the queue entry and finalizing the order when the inspection
    /// completed.
    pub async fn complete_appointment(
        &self,
        order_id: i64,
        outcome_status: AppointmentStatus,
    ) -> Result<Appointment> {
        if !matches!(
            outcome_status,
            AppointmentStatus::Completed
                | AppointmentStatus::Failed
                | AppointmentStatus::IneffectiveNoRetry
                | AppointmentStatus::IneffectiveWithRetry
        ) {
            return Err(CitasError::ValidationError(format!(
                "{outcome_status} is not a valid inspection outcome"
            )));
        }

        let lock = self.order_lock(order_id);
        let _guard = lock.lock().await;

        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| CitasError::NotFoundError(format!("order {order_id}")))?;

        let active = self
            .store
            .active_appointments_for_order(order_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                CitasError::NotFoundError(format!("order {order_id} has no active appointment"))
            })?;

        let appointment = self
            .store
            .update_appointment_status(active.id, outcome_status)
            .await?;

        let order = if outcome_status == AppointmentStatus::Completed {
            self.store
                .mark_queue_completed(order_id, appointment.updated_at)
                .await?;
            self.store
                .update_order_status(order_id, OrderStatus::Finalized)
                .await?
        } else {
            order
        };

        self.emit_order_status_updated(&order);
        self.emit_queue_status_update(&order.order_number, order.id);

        Ok(appointment)
    }

    /// Append an immutable call log for a contact attempt. A Created order
    /// moves to InContact; an outcome flagged `creates_schedule` folds
    /// straight into appointment creation, linking the new appointment back
    /// to this call.
    pub async fn log_call(&self, request: LogCall) -> Result<CallLog> {
        let order = self
            .store
            .find_order(request.order_id)
            .await?
            .ok_or_else(|| CitasError::NotFoundError(format!("order {}", request.order_id)))?;

        if order.assigned_agent_id != Some(request.agent_id) {
            return Err(CitasError::NotFoundError(format!(
                "order {} is not assigned to agent {}",
                request.order_id, request.agent_id
            )));
        }

        let creates_schedule = request.status.creates_schedule;
        if creates_schedule && request.schedule.is_none() {
            return Err(CitasError::ValidationError(
                "call outcome creates a schedule but no schedule details were provided".to_string(),
            ));
        }

        let log = self
            .store
            .append_call_log(NewCallLog {
                order_id: request.order_id,
                agent_id: request.agent_id,
                status: request.status,
                comments: request.comments,
            })
            .await?;

        let order = if order.status == OrderStatus::Created {
            self.store
                .update_order_status(order.id, OrderStatus::InContact)
                .await?
        } else {
            order
        };

        self.hub.send_to_role(
            "coordinator",
            RealtimeEvent::for_order(
                events::CALL_LOGGED,
                order.id,
                order.order_number.clone(),
                format!("Call logged for order {}", order.order_number),
            ),
        );

        if let Some(schedule) = request.schedule.filter(|_| creates_schedule) {
            self.create_appointment(CreateAppointment {
                order_id: order.id,
                modality: schedule.modality,
                scheduled_at: schedule.scheduled_at,
                sede_id: schedule.sede_id,
                actor: Actor::ContactAgent(request.agent_id),
                call_log_id: Some(log.id),
            })
            .await?;
        }

        Ok(log)
    }

    fn emit_order_status_updated(&self, order: &crate::models::InspectionOrder) {
        let event = RealtimeEvent::for_order(
            events::ORDER_STATUS_UPDATED,
            order.id,
            order.order_number.clone(),
            format!("Order {} is now {}", order.order_number, order.status),
        );
        self.hub.send_to_role("coordinator", event.clone());
        if let Some(agent_id) = order.assigned_agent_id {
            self.hub.send_to_principal(&agent_id.to_string(), event);
        }
    }

    fn emit_queue_status_update(&self, order_number: &str, order_id: i64) {
        self.hub.send_to_role(
            "coordinator",
            RealtimeEvent::for_order(
                events::QUEUE_STATUS_UPDATE,
                order_id,
                order_number,
                "Virtual inspection queue changed",
            ),
        );
    }
}
