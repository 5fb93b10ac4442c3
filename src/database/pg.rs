//! # Postgres Store
//!
//! Production [`InspectionStore`] implementation over sqlx. Status columns
//! are stored as text and parsed through the state-machine enums; the
//! supersession sequence runs inside a transaction holding a per-order
//! advisory lock, with a partial unique index
//! (`idx_appointments_single_active`) backing the single-active-appointment
//! invariant at the store layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{CitasError, Result};
use crate::models::{
    Appointment, CallLog, InspectionOrder, InspectionQueueEntry, IntermediaryAccount,
    NewAppointment, NewCallLog, NewInspectionOrder, NewNotification, NewQueueEntry, Notification,
    NotificationStatus,
};
use crate::state_machine::{AppointmentStatus, OrderStatus};

use super::store::{InspectionStore, SupersessionOutcome};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Run the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CitasError::DatabaseError(e.to_string()))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn parse_field<T>(value: &str, field: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| CitasError::InternalError(format!("corrupt {field} column: {e}")))
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    client_name: String,
    client_email: Option<String>,
    client_phone: Option<String>,
    vehicle_plate: String,
    vehicle_brand: Option<String>,
    vehicle_model: Option<String>,
    status: String,
    status_internal: String,
    assigned_agent_id: Option<i64>,
    source: String,
    intermediary_key: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for InspectionOrder {
    type Error = CitasError;

    fn try_from(row: OrderRow) -> Result<Self> {
        Ok(InspectionOrder {
            id: row.id,
            order_number: row.order_number,
            client_name: row.client_name,
            client_email: row.client_email,
            client_phone: row.client_phone,
            vehicle_plate: row.vehicle_plate,
            vehicle_brand: row.vehicle_brand,
            vehicle_model: row.vehicle_model,
            status: parse_field(&row.status, "status")?,
            status_internal: parse_field(&row.status_internal, "status_internal")?,
            assigned_agent_id: row.assigned_agent_id,
            source: parse_field(&row.source, "source")?,
            intermediary_key: row.intermediary_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AppointmentRow {
    id: i64,
    order_id: i64,
    modality: String,
    session_id: Uuid,
    status: String,
    scheduled_at: Option<DateTime<Utc>>,
    sede_id: Option<i64>,
    inspector_id: Option<i64>,
    call_log_id: Option<i64>,
    assigned_at: Option<DateTime<Utc>>,
    sent_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    read_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    failed_at: Option<DateTime<Utc>>,
    retry_count: i32,
    is_retry: bool,
    retry_reason: Option<String>,
    retried_at: Option<DateTime<Utc>>,
    previous_session_ids: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = CitasError;

    fn try_from(row: AppointmentRow) -> Result<Self> {
        let previous_session_ids: Vec<Uuid> = serde_json::from_value(row.previous_session_ids)
            .map_err(|e| {
                CitasError::InternalError(format!("corrupt previous_session_ids column: {e}"))
            })?;
        Ok(Appointment {
            id: row.id,
            order_id: row.order_id,
            modality: parse_field(&row.modality, "modality")?,
            session_id: row.session_id,
            status: parse_field(&row.status, "status")?,
            scheduled_at: row.scheduled_at,
            sede_id: row.sede_id,
            inspector_id: row.inspector_id,
            call_log_id: row.call_log_id,
            assigned_at: row.assigned_at,
            sent_at: row.sent_at,
            delivered_at: row.delivered_at,
            read_at: row.read_at,
            completed_at: row.completed_at,
            failed_at: row.failed_at,
            retry_count: row.retry_count,
            is_retry: row.is_retry,
            retry_reason: row.retry_reason,
            retried_at: row.retried_at,
            previous_session_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct QueueEntryRow {
    id: i64,
    order_id: i64,
    estado: String,
    prioridad: i32,
    tiempo_ingreso: DateTime<Utc>,
    tiempo_inicio: Option<DateTime<Utc>>,
    tiempo_fin: Option<DateTime<Utc>>,
    inspector_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<QueueEntryRow> for InspectionQueueEntry {
    type Error = CitasError;

    fn try_from(row: QueueEntryRow) -> Result<Self> {
        Ok(InspectionQueueEntry {
            id: row.id,
            order_id: row.order_id,
            estado: parse_field(&row.estado, "estado")?,
            prioridad: row.prioridad,
            tiempo_ingreso: row.tiempo_ingreso,
            tiempo_inicio: row.tiempo_inicio,
            tiempo_fin: row.tiempo_fin,
            inspector_id: row.inspector_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct CallLogRow {
    id: i64,
    order_id: i64,
    agent_id: i64,
    status_code: String,
    creates_schedule: bool,
    comments: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CallLogRow> for CallLog {
    fn from(row: CallLogRow) -> Self {
        CallLog {
            id: row.id,
            order_id: row.order_id,
            agent_id: row.agent_id,
            status_code: row.status_code,
            creates_schedule: row.creates_schedule,
            comments: row.comments,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: i64,
    order_id: Option<i64>,
    recipient: String,
    channel: String,
    content: String,
    priority: i32,
    status: String,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = CitasError;

    fn try_from(row: NotificationRow) -> Result<Self> {
        Ok(Notification {
            id: row.id,
            order_id: row.order_id,
            recipient: row.recipient,
            channel: parse_field(&row.channel, "channel")?,
            content: row.content,
            priority: row.priority,
            status: parse_field(&row.status, "status")?,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct IntermediaryRow {
    id: i64,
    key: String,
    contact_email: String,
    contact_phone: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<IntermediaryRow> for IntermediaryAccount {
    fn from(row: IntermediaryRow) -> Self {
        IntermediaryAccount {
            id: row.id,
            key: row.key,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, order_number, client_name, client_email, client_phone, \
     vehicle_plate, vehicle_brand, vehicle_model, status, status_internal, assigned_agent_id, \
     source, intermediary_key, created_at, updated_at, deleted_at";

const APPOINTMENT_COLUMNS: &str = "id, order_id, modality, session_id, status, scheduled_at, \
     sede_id, inspector_id, call_log_id, assigned_at, sent_at, delivered_at, read_at, \
     completed_at, failed_at, retry_count, is_retry, retry_reason, retried_at, \
     previous_session_ids, created_at, updated_at, deleted_at";

const QUEUE_COLUMNS: &str = "id, order_id, estado, prioridad, tiempo_ingreso, tiempo_inicio, \
     tiempo_fin, inspector_id, created_at, updated_at, deleted_at";

#[async_trait]
impl InspectionStore for PgStore {
    async fn create_order(&self, new_order: NewInspectionOrder) -> Result<InspectionOrder> {
        let sql = format!(
            "INSERT INTO citas_inspection_orders \
             (order_number, client_name, client_email, client_phone, vehicle_plate, \
              vehicle_brand, vehicle_model, source, intermediary_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(&new_order.order_number)
            .bind(&new_order.client_name)
            .bind(&new_order.client_email)
            .bind(&new_order.client_phone)
            .bind(&new_order.vehicle_plate)
            .bind(&new_order.vehicle_brand)
            .bind(&new_order.vehicle_model)
            .bind(new_order.source.to_string())
            .bind(&new_order.intermediary_key)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn find_order(&self, order_id: i64) -> Result<Option<InspectionOrder>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM citas_inspection_orders \
             WHERE id = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<InspectionOrder> {
        let sql = format!(
            "UPDATE citas_inspection_orders SET status = $1, updated_at = NOW() \
             WHERE id = $2 AND deleted_at IS NULL \
             RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(status.to_string())
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CitasError::NotFoundError(format!("order {order_id}")))?;
        row.try_into()
    }

    async fn update_order_agent(
        &self,
        order_id: i64,
        agent_id: Option<i64>,
    ) -> Result<InspectionOrder> {
        let sql = format!(
            "UPDATE citas_inspection_orders SET assigned_agent_id = $1, updated_at = NOW() \
             WHERE id = $2 AND deleted_at IS NULL \
             RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(agent_id)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CitasError::NotFoundError(format!("order {order_id}")))?;
        row.try_into()
    }

    async fn find_appointment(&self, appointment_id: i64) -> Result<Option<Appointment>> {
        let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM citas_appointments WHERE id = $1");
        let row = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(appointment_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn active_appointments_for_order(&self, order_id: i64) -> Result<Vec<Appointment>> {
        let sql = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM citas_appointments \
             WHERE order_id = $1 AND deleted_at IS NULL"
        );
        let rows = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn active_appointments(&self) -> Result<Vec<Appointment>> {
        let sql = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM citas_appointments WHERE deleted_at IS NULL"
        );
        let rows = sqlx::query_as::<_, AppointmentRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn supersede_and_create_appointment(
        &self,
        new: NewAppointment,
    ) -> Result<SupersessionOutcome> {
        let mut tx = self.pool.begin().await?;

        // Serialize concurrent supersessions per order for the duration of
        // the transaction; released automatically on commit/rollback.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(new.order_id)
            .execute(&mut *tx)
            .await?;

        let tombstone_sql = format!(
            "UPDATE citas_appointments \
             SET deleted_at = NOW(), updated_at = NOW() \
             WHERE order_id = $1 AND deleted_at IS NULL \
             RETURNING {APPOINTMENT_COLUMNS}"
        );
        let superseded_rows = sqlx::query_as::<_, AppointmentRow>(&tombstone_sql)
            .bind(new.order_id)
            .fetch_all(&mut *tx)
            .await?;

        let superseded: Vec<Appointment> = superseded_rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<_>>()?;

        let mut lineage: Vec<Uuid> = Vec::new();
        let mut prior_retry_count = 0;
        for appointment in &superseded {
            lineage.extend(appointment.previous_session_ids.iter().copied());
            lineage.push(appointment.session_id);
            prior_retry_count = prior_retry_count.max(appointment.retry_count);
        }

        let retry_count = if new.is_retry { prior_retry_count + 1 } else { 0 };
        let assigned_now = new.status == AppointmentStatus::Assigned;

        let insert_sql = format!(
            "INSERT INTO citas_appointments \
             (order_id, modality, session_id, status, scheduled_at, sede_id, inspector_id, \
              call_log_id, assigned_at, retry_count, is_retry, retry_reason, retried_at, \
              previous_session_ids) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, \
                     CASE WHEN $9 THEN NOW() ELSE NULL END, \
                     $10, $11, $12, \
                     CASE WHEN $11 THEN NOW() ELSE NULL END, \
                     $13) \
             RETURNING {APPOINTMENT_COLUMNS}"
        );
        let created_row = sqlx::query_as::<_, AppointmentRow>(&insert_sql)
            .bind(new.order_id)
            .bind(new.modality.to_string())
            .bind(Uuid::new_v4())
            .bind(new.status.to_string())
            .bind(new.scheduled_at)
            .bind(new.sede_id)
            .bind(new.inspector_id)
            .bind(new.call_log_id)
            .bind(assigned_now)
            .bind(retry_count)
            .bind(new.is_retry)
            .bind(&new.retry_reason)
            .bind(
                serde_json::to_value(&lineage)
                    .map_err(|e| CitasError::InternalError(e.to_string()))?,
            )
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(SupersessionOutcome {
            created: created_row.try_into()?,
            superseded,
        })
    }

    async fn update_appointment_status(
        &self,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> Result<Appointment> {
        // Column name comes from the status enum, never from user input.
        let sql = match status.timestamp_field() {
            Some(column) => format!(
                "UPDATE citas_appointments \
                 SET status = $1, {column} = NOW(), updated_at = NOW() \
                 WHERE id = $2 AND deleted_at IS NULL \
                 RETURNING {APPOINTMENT_COLUMNS}"
            ),
            None => format!(
                "UPDATE citas_appointments SET status = $1, updated_at = NOW() \
                 WHERE id = $2 AND deleted_at IS NULL \
                 RETURNING {APPOINTMENT_COLUMNS}"
            ),
        };
        let row = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(status.to_string())
            .bind(appointment_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CitasError::NotFoundError(format!("appointment {appointment_id}")))?;
        row.try_into()
    }

    async fn create_queue_entry(&self, new_entry: NewQueueEntry) -> Result<InspectionQueueEntry> {
        let sql = format!(
            "INSERT INTO citas_queue_entries (order_id, prioridad, tiempo_ingreso) \
             VALUES ($1, $2, COALESCE($3, NOW())) \
             RETURNING {QUEUE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, QueueEntryRow>(&sql)
            .bind(new_entry.order_id)
            .bind(new_entry.prioridad)
            .bind(new_entry.tiempo_ingreso)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn active_queue_entries(&self) -> Result<Vec<InspectionQueueEntry>> {
        let sql = format!(
            "SELECT {QUEUE_COLUMNS} FROM citas_queue_entries \
             WHERE deleted_at IS NULL AND estado IN ('en_cola', 'en_proceso')"
        );
        let rows = sqlx::query_as::<_, QueueEntryRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn queue_entry_for_order(&self, order_id: i64) -> Result<Option<InspectionQueueEntry>> {
        let sql = format!(
            "SELECT {QUEUE_COLUMNS} FROM citas_queue_entries \
             WHERE order_id = $1 AND deleted_at IS NULL AND estado IN ('en_cola', 'en_proceso')"
        );
        let row = sqlx::query_as::<_, QueueEntryRow>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn mark_queue_in_progress(
        &self,
        order_id: i64,
        inspector_id: i64,
        started_at: DateTime<Utc>,
    ) -> Result<Option<InspectionQueueEntry>> {
        let sql = format!(
            "UPDATE citas_queue_entries \
             SET estado = 'en_proceso', inspector_id = $1, tiempo_inicio = $2, updated_at = NOW() \
             WHERE order_id = $3 AND deleted_at IS NULL AND estado IN ('en_cola', 'en_proceso') \
             RETURNING {QUEUE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, QueueEntryRow>(&sql)
            .bind(inspector_id)
            .bind(started_at)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn mark_queue_completed(
        &self,
        order_id: i64,
        finished_at: DateTime<Utc>,
    ) -> Result<Option<InspectionQueueEntry>> {
        let sql = format!(
            "UPDATE citas_queue_entries \
             SET estado = 'completada', tiempo_fin = $1, updated_at = NOW() \
             WHERE order_id = $2 AND deleted_at IS NULL AND estado IN ('en_cola', 'en_proceso') \
             RETURNING {QUEUE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, QueueEntryRow>(&sql)
            .bind(finished_at)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn append_call_log(&self, new_log: NewCallLog) -> Result<CallLog> {
        let row = sqlx::query_as::<_, CallLogRow>(
            "INSERT INTO citas_call_logs (order_id, agent_id, status_code, creates_schedule, comments) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, order_id, agent_id, status_code, creates_schedule, comments, created_at",
        )
        .bind(new_log.order_id)
        .bind(new_log.agent_id)
        .bind(&new_log.status.code)
        .bind(new_log.status.creates_schedule)
        .bind(&new_log.comments)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn create_notification(&self, new_notification: NewNotification) -> Result<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "INSERT INTO citas_notifications \
             (order_id, recipient, channel, content, priority, status, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, order_id, recipient, channel, content, priority, status, metadata, \
                       created_at, updated_at",
        )
        .bind(new_notification.order_id)
        .bind(&new_notification.recipient)
        .bind(new_notification.channel.to_string())
        .bind(&new_notification.content)
        .bind(new_notification.priority)
        .bind(new_notification.status.to_string())
        .bind(&new_notification.metadata)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn update_notification_status(
        &self,
        notification_id: i64,
        status: NotificationStatus,
    ) -> Result<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "UPDATE citas_notifications SET status = $1, updated_at = NOW() \
             WHERE id = $2 \
             RETURNING id, order_id, recipient, channel, content, priority, status, metadata, \
                       created_at, updated_at",
        )
        .bind(status.to_string())
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CitasError::NotFoundError(format!("notification {notification_id}")))?;
        row.try_into()
    }

    async fn find_active_intermediary(&self, key: &str) -> Result<Option<IntermediaryAccount>> {
        let row = sqlx::query_as::<_, IntermediaryRow>(
            "SELECT id, key, contact_email, contact_phone, active, created_at, updated_at \
             FROM citas_intermediary_accounts \
             WHERE key = $1 AND active = TRUE",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }
}
