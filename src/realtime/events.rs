//! # Realtime Event Payloads
//!
//! The wire payloads pushed to operator sessions. Event names are frozen for
//! compatibility with deployed consoles, see [`crate::constants::events`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::events;
use crate::models::OrderSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    /// Event type; one of the frozen names in [`crate::constants::events`].
    pub event: String,
    pub order_id: Option<i64>,
    pub order_number: Option<String>,
    /// Human-readable message shown in the operator console.
    pub message: String,
    /// ISO-8601 emission timestamp.
    pub timestamp: DateTime<Utc>,
    /// Denormalized order snapshot, carried on assignment/removal events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<OrderSnapshot>,
}

impl RealtimeEvent {
    pub fn new(event: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            order_id: None,
            order_number: None,
            message: message.into(),
            timestamp: Utc::now(),
            snapshot: None,
        }
    }

    pub fn for_order(
        event: impl Into<String>,
        order_id: i64,
        order_number: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event: event.into(),
            order_id: Some(order_id),
            order_number: Some(order_number.into()),
            message: message.into(),
            timestamp: Utc::now(),
            snapshot: None,
        }
    }

    pub fn with_snapshot(mut self, snapshot: OrderSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn order_assigned(snapshot: OrderSnapshot, message: impl Into<String>) -> Self {
        Self::for_order(
            events::ORDER_ASSIGNED,
            snapshot.order_id,
            snapshot.order_number.clone(),
            message,
        )
        .with_snapshot(snapshot)
    }

    pub fn order_removed(snapshot: OrderSnapshot, message: impl Into<String>) -> Self {
        Self::for_order(
            events::ORDER_REMOVED,
            snapshot.order_id,
            snapshot.order_number.clone(),
            message,
        )
        .with_snapshot(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::OrderStatus;

    #[test]
    fn test_payload_shape() {
        let event = RealtimeEvent::for_order("queueStatusUpdate", 5, "ORD-5", "queue moved");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "queueStatusUpdate");
        assert_eq!(json["order_id"], 5);
        assert!(json["timestamp"].is_string());
        // Snapshot is omitted entirely when absent.
        assert!(json.get("snapshot").is_none());
    }

    #[test]
    fn test_assignment_event_carries_snapshot() {
        let snapshot = OrderSnapshot {
            order_id: 3,
            order_number: "ORD-3".to_string(),
            client_name: "Luz Prieto".to_string(),
            vehicle_plate: "XYZ-987".to_string(),
            status: OrderStatus::Scheduled,
        };
        let event = RealtimeEvent::order_assigned(snapshot, "order assigned to you");
        assert_eq!(event.event, "order_assigned");
        assert_eq!(event.order_id, Some(3));
        let carried = event.snapshot.expect("snapshot should be carried");
        assert_eq!(carried.vehicle_plate, "XYZ-987");
    }
}
