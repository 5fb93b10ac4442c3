//! # Inspection Queue Entry Model
//!
//! One row per order waiting for or undergoing virtual inspection. A queue
//! entry correlates with zero-or-one active appointment for the same order;
//! only the reconciler is allowed to merge the two into a derived view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state_machine::QueueState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionQueueEntry {
    pub id: i64,
    pub order_id: i64,
    pub estado: QueueState,
    pub prioridad: i32,
    pub tiempo_ingreso: DateTime<Utc>,
    pub tiempo_inicio: Option<DateTime<Utc>>,
    pub tiempo_fin: Option<DateTime<Utc>>,
    pub inspector_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// New queue entry for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQueueEntry {
    pub order_id: i64,
    pub prioridad: i32,
    pub tiempo_ingreso: Option<DateTime<Utc>>,
}

impl InspectionQueueEntry {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none() && self.estado.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_entry_is_not_active() {
        let entry = InspectionQueueEntry {
            id: 1,
            order_id: 2,
            estado: QueueState::Completada,
            prioridad: 0,
            tiempo_ingreso: Utc::now(),
            tiempo_inicio: Some(Utc::now()),
            tiempo_fin: Some(Utc::now()),
            inspector_id: Some(4),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        assert!(!entry.is_active());
    }
}
