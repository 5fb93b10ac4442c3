//! # Notification Intents and Recipient Resolution
//!
//! An intent names *who should learn about what* without committing to an
//! address. Resolution is rule-based over the typed order classification:
//! direct orders notify the client's own contact details, intermediary
//! orders notify the active account behind the stored key. An intent whose
//! rule resolves to nothing is dropped with a log line, never retried.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::database::InspectionStore;
use crate::error::Result;
use crate::models::Channel;
use crate::state_machine::OrderSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Assignment,
    Reassignment,
    Removal,
    AppointmentCreated,
    CallLogged,
    OperationsAlert,
}

/// How to find the recipient for an intent.
#[derive(Debug, Clone, PartialEq)]
pub enum RecipientRule {
    /// The order's own notification target, resolved through its `source`
    /// classification.
    OrderContact { order_id: i64 },
    /// An operator's in-app inbox.
    AgentInbox { agent_id: i64 },
    /// A fixed address, e.g. the operations distribution list.
    FixedAddress { address: String },
}

#[derive(Debug, Clone)]
pub struct NotificationIntent {
    pub kind: IntentKind,
    pub order_id: Option<i64>,
    pub rule: RecipientRule,
    pub channels: Vec<Channel>,
    pub content: String,
    pub priority: i32,
    pub metadata: Option<serde_json::Value>,
}

/// Addresses a rule resolved to, one slot per channel family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedRecipient {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub inbox: Option<String>,
}

impl ResolvedRecipient {
    pub fn address_for(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Email => self.email.as_deref(),
            Channel::Sms => self.phone.as_deref(),
            Channel::InApp => self.inbox.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none() && self.inbox.is_none()
    }
}

#[derive(Clone)]
pub struct RecipientResolver {
    store: Arc<dyn InspectionStore>,
}

impl RecipientResolver {
    pub fn new(store: Arc<dyn InspectionStore>) -> Self {
        Self { store }
    }

    /// Resolve a rule to concrete addresses. `Ok(None)` means the intent has
    /// no reachable recipient and must be dropped by the caller.
    pub async fn resolve(&self, rule: &RecipientRule) -> Result<Option<ResolvedRecipient>> {
        let resolved = match rule {
            RecipientRule::OrderContact { order_id } => {
                let Some(order) = self.store.find_order(*order_id).await? else {
                    info!(order_id, "recipient resolution: order not found, dropping intent");
                    return Ok(None);
                };
                match order.source {
                    OrderSource::Direct => ResolvedRecipient {
                        email: order.client_email,
                        phone: order.client_phone,
                        inbox: None,
                    },
                    OrderSource::Intermediary => {
                        let Some(key) = order.intermediary_key.as_deref() else {
                            info!(order_id, "intermediary order without key, dropping intent");
                            return Ok(None);
                        };
                        let Some(account) = self.store.find_active_intermediary(key).await? else {
                            info!(order_id, key, "no active intermediary account, dropping intent");
                            return Ok(None);
                        };
                        ResolvedRecipient {
                            email: Some(account.contact_email),
                            phone: account.contact_phone,
                            inbox: None,
                        }
                    }
                }
            }
            RecipientRule::AgentInbox { agent_id } => ResolvedRecipient {
                email: None,
                phone: None,
                inbox: Some(format!("agent:{agent_id}")),
            },
            RecipientRule::FixedAddress { address } => ResolvedRecipient {
                email: Some(address.clone()),
                phone: None,
                inbox: None,
            },
        };

        if resolved.is_empty() {
            info!(?rule, "recipient resolved to no addresses, dropping intent");
            return Ok(None);
        }
        Ok(Some(resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::{IntermediaryAccount, NewInspectionOrder};
    use chrono::Utc;

    fn new_order(source: OrderSource, key: Option<&str>, email: Option<&str>) -> NewInspectionOrder {
        NewInspectionOrder {
            order_number: "ORD-55".to_string(),
            client_name: "Pablo Ruiz".to_string(),
            client_email: email.map(str::to_string),
            client_phone: None,
            vehicle_plate: "JDK-310".to_string(),
            vehicle_brand: None,
            vehicle_model: None,
            source,
            intermediary_key: key.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_direct_order_resolves_to_client_contact() {
        let store = Arc::new(MemoryStore::new());
        let order = store
            .create_order(new_order(OrderSource::Direct, None, Some("pablo@example.com")))
            .await
            .unwrap();

        let resolver = RecipientResolver::new(store);
        let resolved = resolver
            .resolve(&RecipientRule::OrderContact { order_id: order.id })
            .await
            .unwrap()
            .expect("direct order should resolve");
        assert_eq!(resolved.email.as_deref(), Some("pablo@example.com"));
    }

    #[tokio::test]
    async fn test_intermediary_order_resolves_through_account_lookup() {
        let store = Arc::new(MemoryStore::new());
        store.insert_intermediary(IntermediaryAccount {
            id: 1,
            key: "ASEG-01".to_string(),
            contact_email: "citas@aseguradora.example".to_string(),
            contact_phone: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        let order = store
            .create_order(new_order(OrderSource::Intermediary, Some("ASEG-01"), None))
            .await
            .unwrap();

        let resolver = RecipientResolver::new(store);
        let resolved = resolver
            .resolve(&RecipientRule::OrderContact { order_id: order.id })
            .await
            .unwrap()
            .expect("intermediary order should resolve");
        assert_eq!(
            resolved.email.as_deref(),
            Some("citas@aseguradora.example")
        );
    }

    #[tokio::test]
    async fn test_unresolvable_intent_is_dropped() {
        let store = Arc::new(MemoryStore::new());
        // Intermediary source but no account seeded for the key.
        let order = store
            .create_order(new_order(OrderSource::Intermediary, Some("GONE"), None))
            .await
            .unwrap();

        let resolver = RecipientResolver::new(store.clone());
        assert!(resolver
            .resolve(&RecipientRule::OrderContact { order_id: order.id })
            .await
            .unwrap()
            .is_none());

        // Direct order with no contact details at all.
        let bare = store
            .create_order(new_order(OrderSource::Direct, None, None))
            .await
            .unwrap();
        assert!(resolver
            .resolve(&RecipientRule::OrderContact { order_id: bare.id })
            .await
            .unwrap()
            .is_none());
    }
}
