//! # Realtime Hub
//!
//! Delivery primitives over the connection registry. This is the only
//! surface other components hold; it exposes sends, never mutation of the
//! registry or room maps.

use std::sync::Arc;
use tracing::debug;

use crate::constants::rooms;
use crate::realtime::events::RealtimeEvent;
use crate::realtime::registry::ConnectionRegistry;

#[derive(Clone)]
pub struct RealtimeHub {
    registry: Arc<ConnectionRegistry>,
}

impl RealtimeHub {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn with_capacity(channel_capacity: usize) -> Self {
        Self::new(Arc::new(ConnectionRegistry::new(channel_capacity)))
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Send to a principal: direct session first, identity-room fallback so
    /// the message is not lost solely because the registry entry is stale.
    /// Returns the number of sessions reached.
    pub fn send_to_principal(&self, principal_id: &str, event: RealtimeEvent) -> usize {
        if let Some(session_id) = self.registry.session_for_principal(principal_id) {
            if self.registry.push(session_id, event.clone()) {
                return 1;
            }
        }
        let room = format!("{}{}", rooms::USER_PREFIX, principal_id);
        let delivered = self.send_to_room(&room, event);
        if delivered == 0 {
            debug!(principal = %principal_id, "principal unreachable, event dropped");
        }
        delivered
    }

    /// Send to every still-open session holding the role.
    pub fn send_to_role(&self, role: &str, event: RealtimeEvent) -> usize {
        self.send_to_room(&format!("{}{}", rooms::ROLE_PREFIX, role), event)
    }

    /// Send to an arbitrary room.
    pub fn send_to_room(&self, room: &str, event: RealtimeEvent) -> usize {
        let mut delivered = 0;
        for session_id in self.registry.room_members(room) {
            if self.registry.push(session_id, event.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Send to every connected session.
    pub fn broadcast(&self, event: RealtimeEvent) -> usize {
        let mut delivered = 0;
        for session_id in self.registry.all_sessions() {
            if self.registry.push(session_id, event.clone()) {
                delivered += 1;
            }
        }
        delivered
    }
}
