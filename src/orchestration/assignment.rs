//! # Assignment Manager
//!
//! (Re)assigns contact agents to orders with symmetric
//! notify-old/notify-new semantics. The two notification legs are
//! independent: a failing removal notice never suppresses the assignment
//! notice, and vice versa.

use std::sync::Arc;

use crate::database::InspectionStore;
use crate::error::{CitasError, Result};
use crate::models::{Channel, InspectionOrder};
use crate::notifications::{IntentKind, NotificationDispatcher, NotificationIntent, RecipientRule};
use crate::realtime::{RealtimeEvent, RealtimeHub};

pub struct AssignmentManager {
    store: Arc<dyn InspectionStore>,
    hub: RealtimeHub,
    dispatcher: Arc<NotificationDispatcher>,
}

impl AssignmentManager {
    pub fn new(
        store: Arc<dyn InspectionStore>,
        hub: RealtimeHub,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            hub,
            dispatcher,
        }
    }

    /// Assign, reassign, or clear (None) the contact agent for an order.
    ///
    /// The agent column is updated unconditionally; the notification legs
    /// that follow are best-effort and mutually independent.
    pub async fn assign_agent(
        &self,
        order_id: i64,
        new_agent_id: Option<i64>,
    ) -> Result<InspectionOrder> {
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| CitasError::NotFoundError(format!("order {order_id}")))?;
        let previous_agent_id = order.assigned_agent_id;

        let updated = self.store.update_order_agent(order_id, new_agent_id).await?;
        let snapshot = updated.snapshot();

        if let Some(previous) = previous_agent_id {
            if new_agent_id != Some(previous) {
                self.dispatcher
                    .dispatch(NotificationIntent {
                        kind: IntentKind::Removal,
                        order_id: Some(order_id),
                        rule: RecipientRule::AgentInbox { agent_id: previous },
                        channels: vec![Channel::InApp],
                        content: format!(
                            "Order {} is no longer assigned to you",
                            snapshot.order_number
                        ),
                        priority: 1,
                        metadata: None,
                    })
                    .await;
                self.hub.send_to_principal(
                    &previous.to_string(),
                    RealtimeEvent::order_removed(
                        snapshot.clone(),
                        format!("Order {} was removed from your list", snapshot.order_number),
                    ),
                );
            }
        }

        if let Some(new_agent) = new_agent_id {
            if previous_agent_id != Some(new_agent) {
                let kind = if previous_agent_id.is_some() {
                    IntentKind::Reassignment
                } else {
                    IntentKind::Assignment
                };
                self.dispatcher
                    .dispatch(NotificationIntent {
                        kind,
                        order_id: Some(order_id),
                        rule: RecipientRule::AgentInbox {
                            agent_id: new_agent,
                        },
                        channels: vec![Channel::InApp],
                        content: format!(
                            "Order {} has been assigned to you",
                            snapshot.order_number
                        ),
                        priority: 1,
                        metadata: None,
                    })
                    .await;
                self.hub.send_to_principal(
                    &new_agent.to_string(),
                    RealtimeEvent::order_assigned(
                        snapshot.clone(),
                        format!("Order {} was assigned to you", snapshot.order_number),
                    ),
                );
            }
        }

        Ok(updated)
    }
}
