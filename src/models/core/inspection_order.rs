//! # Inspection Order Model
//!
//! The service request that everything else hangs off: one row per vehicle
//! inspection requested by a client, created by intake and mutated by
//! assignment, call logging, and appointment creation.
//!
//! Orders are never hard-deleted; `deleted_at` tombstones a row and excludes
//! it from every active query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state_machine::{OrderSource, OrderStatus, StatusInternal};

/// A vehicle-inspection service request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionOrder {
    pub id: i64,
    pub order_number: String,
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub vehicle_plate: String,
    pub vehicle_brand: Option<String>,
    pub vehicle_model: Option<String>,
    pub status: OrderStatus,
    pub status_internal: StatusInternal,
    pub assigned_agent_id: Option<i64>,
    /// Typed account classification set at creation; drives recipient
    /// resolution for notifications.
    pub source: OrderSource,
    /// Lookup key for the intermediary account when `source` is Intermediary.
    pub intermediary_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// New order for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInspectionOrder {
    pub order_number: String,
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub vehicle_plate: String,
    pub vehicle_brand: Option<String>,
    pub vehicle_model: Option<String>,
    pub source: OrderSource,
    pub intermediary_key: Option<String>,
}

/// Denormalized client/plate/status snapshot carried on assignment and
/// removal realtime events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: i64,
    pub order_number: String,
    pub client_name: String,
    pub vehicle_plate: String,
    pub status: OrderStatus,
}

impl InspectionOrder {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            order_id: self.id,
            order_number: self.order_number.clone(),
            client_name: self.client_name.clone(),
            vehicle_plate: self.vehicle_plate.clone(),
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> InspectionOrder {
        InspectionOrder {
            id: 7,
            order_number: "ORD-2025-0007".to_string(),
            client_name: "Marta Gil".to_string(),
            client_email: Some("marta@example.com".to_string()),
            client_phone: None,
            vehicle_plate: "KJX-482".to_string(),
            vehicle_brand: Some("Renault".to_string()),
            vehicle_model: Some("Logan".to_string()),
            status: OrderStatus::InContact,
            status_internal: StatusInternal::None,
            assigned_agent_id: Some(3),
            source: OrderSource::Direct,
            intermediary_key: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_snapshot_carries_denormalized_fields() {
        let order = sample_order();
        let snapshot = order.snapshot();
        assert_eq!(snapshot.order_id, 7);
        assert_eq!(snapshot.order_number, "ORD-2025-0007");
        assert_eq!(snapshot.vehicle_plate, "KJX-482");
        assert_eq!(snapshot.status, OrderStatus::InContact);
    }

    #[test]
    fn test_tombstone_deactivates() {
        let mut order = sample_order();
        assert!(order.is_active());
        order.deleted_at = Some(Utc::now());
        assert!(!order.is_active());
    }
}
