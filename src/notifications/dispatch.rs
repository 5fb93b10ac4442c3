//! # Notification Dispatcher
//!
//! Takes a [`NotificationIntent`], resolves its recipient, persists one
//! notification row per attempted delivery, and hands the content to the
//! channel sink. The dispatcher's public surface cannot fail: template and
//! transport errors are caught here, logged, and recorded as Failed rows.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::database::InspectionStore;
use crate::models::{Channel, NewNotification, NotificationStatus};
use crate::notifications::recipient::{NotificationIntent, RecipientResolver};

/// Outbound channel transport. Rendering and delivery live outside this
/// core; implementations receive fully-resolved addresses and raw content.
#[async_trait]
pub trait ChannelSink: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        content: &str,
        channel: Channel,
        priority: i32,
        metadata: Option<&serde_json::Value>,
    ) -> std::result::Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("template error: {0}")]
    Template(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Default sink: logs deliveries through tracing. Stands in wherever a real
/// provider binding is not wired up.
#[derive(Debug, Default, Clone)]
pub struct TracingSink;

#[async_trait]
impl ChannelSink for TracingSink {
    async fn send(
        &self,
        recipient: &str,
        content: &str,
        channel: Channel,
        priority: i32,
        _metadata: Option<&serde_json::Value>,
    ) -> std::result::Result<(), SinkError> {
        info!(recipient, %channel, priority, content, "notification delivered (tracing sink)");
        Ok(())
    }
}

pub struct NotificationDispatcher {
    store: Arc<dyn InspectionStore>,
    resolver: RecipientResolver,
    sink: Arc<dyn ChannelSink>,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn InspectionStore>, sink: Arc<dyn ChannelSink>) -> Self {
        let resolver = RecipientResolver::new(store.clone());
        Self {
            store,
            resolver,
            sink,
        }
    }

    /// Dispatch an intent. Infallible by contract: every failure is caught,
    /// logged, and reflected on the persisted notification row.
    pub async fn dispatch(&self, intent: NotificationIntent) {
        let resolved = match self.resolver.resolve(&intent.rule).await {
            Ok(Some(resolved)) => resolved,
            Ok(None) => return, // dropped; resolver already logged it
            Err(err) => {
                warn!(kind = ?intent.kind, error = %err, "recipient resolution failed, intent dropped");
                return;
            }
        };

        let mut attempted = 0;
        for channel in &intent.channels {
            let Some(address) = resolved.address_for(*channel) else {
                debug!(kind = ?intent.kind, %channel, "no address for channel, skipping");
                continue;
            };
            attempted += 1;
            self.deliver(&intent, *channel, address).await;
        }

        if attempted == 0 {
            info!(kind = ?intent.kind, "no deliverable channel for intent, dropped");
        }
    }

    async fn deliver(&self, intent: &NotificationIntent, channel: Channel, address: &str) {
        let row = self
            .store
            .create_notification(NewNotification {
                order_id: intent.order_id,
                recipient: address.to_string(),
                channel,
                content: intent.content.clone(),
                priority: intent.priority,
                status: NotificationStatus::Pending,
                metadata: intent.metadata.clone(),
            })
            .await;

        let row = match row {
            Ok(row) => row,
            Err(err) => {
                warn!(kind = ?intent.kind, error = %err, "failed to persist notification row");
                return;
            }
        };

        let outcome = self
            .sink
            .send(
                address,
                &intent.content,
                channel,
                intent.priority,
                intent.metadata.as_ref(),
            )
            .await;

        let status = match outcome {
            Ok(()) => NotificationStatus::Sent,
            Err(err) => {
                warn!(kind = ?intent.kind, recipient = address, error = %err, "notification delivery failed");
                NotificationStatus::Failed
            }
        };

        if let Err(err) = self.store.update_notification_status(row.id, status).await {
            warn!(notification_id = row.id, error = %err, "failed to record notification outcome");
        }
    }
}
