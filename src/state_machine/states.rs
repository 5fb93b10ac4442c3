use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle stage of an inspection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Initial state when the order is created by intake
    Created,
    /// A contact agent is working the order
    InContact,
    /// An appointment has been scheduled
    Scheduled,
    /// A virtual inspection is in progress
    InInspection,
    /// The inspection concluded successfully
    Finalized,
    /// The order was cancelled
    Cancelled,
    /// The order aged out without completion
    Expired,
}

impl OrderStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Cancelled | Self::Expired)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::InContact => write!(f, "in_contact"),
            Self::Scheduled => write!(f, "scheduled"),
            Self::InInspection => write!(f, "in_inspection"),
            Self::Finalized => write!(f, "finalized"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "in_contact" => Ok(Self::InContact),
            "scheduled" => Ok(Self::Scheduled),
            "in_inspection" => Ok(Self::InInspection),
            "finalized" => Ok(Self::Finalized),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            _ => Err(format!("Invalid order status: {s}")),
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Created
    }
}

/// Internal recovery-tracking status, independent of the public lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusInternal {
    None,
    Recovering,
    Recovered,
    Unrecoverable,
}

impl Default for StatusInternal {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for StatusInternal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Recovering => write!(f, "recovering"),
            Self::Recovered => write!(f, "recovered"),
            Self::Unrecoverable => write!(f, "unrecoverable"),
        }
    }
}

impl std::str::FromStr for StatusInternal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "recovering" => Ok(Self::Recovering),
            "recovered" => Ok(Self::Recovered),
            "unrecoverable" => Ok(Self::Unrecoverable),
            _ => Err(format!("Invalid internal status: {s}")),
        }
    }
}

/// Appointment delivery/execution status.
///
/// The set is ordered but not linear: Retry and the ineffective variants
/// branch off the main Pending → Assigned → Sent → Delivered → Read →
/// Completed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Assigned,
    Sent,
    Delivered,
    Read,
    Completed,
    Failed,
    Retry,
    RevisionSupervisor,
    PendienteCalificacion,
    IneffectiveNoRetry,
    IneffectiveWithRetry,
    CallFinished,
}

impl AppointmentStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::IneffectiveNoRetry | Self::CallFinished
        )
    }

    /// Statuses that allow the claim flow to retry the inspection.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Failed | Self::Retry | Self::IneffectiveWithRetry)
    }

    /// Column stamped when this status is entered, if any.
    pub fn timestamp_field(&self) -> Option<&'static str> {
        match self {
            Self::Assigned => Some("assigned_at"),
            Self::Sent => Some("sent_at"),
            Self::Delivered => Some("delivered_at"),
            Self::Read => Some("read_at"),
            Self::Completed => Some("completed_at"),
            Self::Failed => Some("failed_at"),
            _ => None,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Assigned => write!(f, "assigned"),
            Self::Sent => write!(f, "sent"),
            Self::Delivered => write!(f, "delivered"),
            Self::Read => write!(f, "read"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Retry => write!(f, "retry"),
            Self::RevisionSupervisor => write!(f, "revision_supervisor"),
            Self::PendienteCalificacion => write!(f, "pendiente_calificacion"),
            Self::IneffectiveNoRetry => write!(f, "ineffective_no_retry"),
            Self::IneffectiveWithRetry => write!(f, "ineffective_with_retry"),
            Self::CallFinished => write!(f, "call_finished"),
        }
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "assigned" => Ok(Self::Assigned),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "read" => Ok(Self::Read),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "retry" => Ok(Self::Retry),
            "revision_supervisor" => Ok(Self::RevisionSupervisor),
            "pendiente_calificacion" => Ok(Self::PendienteCalificacion),
            "ineffective_no_retry" => Ok(Self::IneffectiveNoRetry),
            "ineffective_with_retry" => Ok(Self::IneffectiveWithRetry),
            "call_finished" => Ok(Self::CallFinished),
            _ => Err(format!("Invalid appointment status: {s}")),
        }
    }
}

impl Default for AppointmentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// State of a virtual-inspection queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    EnCola,
    EnProceso,
    Completada,
}

impl QueueState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::EnCola | Self::EnProceso)
    }
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnCola => write!(f, "en_cola"),
            Self::EnProceso => write!(f, "en_proceso"),
            Self::Completada => write!(f, "completada"),
        }
    }
}

impl std::str::FromStr for QueueState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en_cola" => Ok(Self::EnCola),
            "en_proceso" => Ok(Self::EnProceso),
            "completada" => Ok(Self::Completada),
            _ => Err(format!("Invalid queue state: {s}")),
        }
    }
}

impl Default for QueueState {
    fn default() -> Self {
        Self::EnCola
    }
}

/// Inspection channel for an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    InSede,
    AtHome,
    Virtual,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InSede => write!(f, "in_sede"),
            Self::AtHome => write!(f, "at_home"),
            Self::Virtual => write!(f, "virtual"),
        }
    }
}

impl std::str::FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_sede" => Ok(Self::InSede),
            "at_home" => Ok(Self::AtHome),
            "virtual" => Ok(Self::Virtual),
            _ => Err(format!("Invalid modality: {s}")),
        }
    }
}

/// Typed account/source classification set at order creation.
///
/// Replaces recipient resolution by substring matching on the order number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSource {
    /// The client owns the order directly; notify their own contact details.
    Direct,
    /// The order came through an intermediary account, resolved by key.
    Intermediary,
}

impl Default for OrderSource {
    fn default() -> Self {
        Self::Direct
    }
}

impl fmt::Display for OrderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Intermediary => write!(f, "intermediary"),
        }
    }
}

impl std::str::FromStr for OrderSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "intermediary" => Ok(Self::Intermediary),
            _ => Err(format!("Invalid order source: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appointment_terminal_check() {
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::Failed.is_terminal());
        assert!(AppointmentStatus::IneffectiveNoRetry.is_terminal());
        assert!(AppointmentStatus::CallFinished.is_terminal());
        assert!(!AppointmentStatus::Pending.is_terminal());
        assert!(!AppointmentStatus::Retry.is_terminal());
        assert!(!AppointmentStatus::IneffectiveWithRetry.is_terminal());
    }

    #[test]
    fn test_appointment_retryable_check() {
        assert!(AppointmentStatus::Failed.is_retryable());
        assert!(AppointmentStatus::IneffectiveWithRetry.is_retryable());
        assert!(!AppointmentStatus::Completed.is_retryable());
        assert!(!AppointmentStatus::IneffectiveNoRetry.is_retryable());
    }

    #[test]
    fn test_timestamp_field_mapping() {
        assert_eq!(
            AppointmentStatus::Assigned.timestamp_field(),
            Some("assigned_at")
        );
        assert_eq!(
            AppointmentStatus::Completed.timestamp_field(),
            Some("completed_at")
        );
        assert_eq!(AppointmentStatus::Retry.timestamp_field(), None);
        assert_eq!(AppointmentStatus::Pending.timestamp_field(), None);
    }

    #[test]
    fn test_state_string_conversion() {
        assert_eq!(
            AppointmentStatus::PendienteCalificacion.to_string(),
            "pendiente_calificacion"
        );
        assert_eq!(
            "ineffective_with_retry".parse::<AppointmentStatus>().unwrap(),
            AppointmentStatus::IneffectiveWithRetry
        );
        assert_eq!(QueueState::EnProceso.to_string(), "en_proceso");
        assert_eq!("en_cola".parse::<QueueState>().unwrap(), QueueState::EnCola);
        assert_eq!(OrderStatus::InContact.to_string(), "in_contact");
        assert_eq!("scheduled".parse::<OrderStatus>().unwrap(), OrderStatus::Scheduled);
    }

    #[test]
    fn test_state_serde() {
        let status = AppointmentStatus::RevisionSupervisor;
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, "\"revision_supervisor\"");

        let parsed: AppointmentStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, status);
    }

    #[test]
    fn test_queue_state_active_check() {
        assert!(QueueState::EnCola.is_active());
        assert!(QueueState::EnProceso.is_active());
        assert!(!QueueState::Completada.is_active());
    }
}
