//! # Connection Registry and Room Membership
//!
//! Maps principal identities to their transport session and tracks room
//! membership. All mutation happens here, in response to connect, disconnect,
//! join, and leave; every other component reaches delivery through
//! [`crate::realtime::RealtimeHub`] and never touches these maps.
//!
//! Registering a new session for an already-connected principal force-closes
//! the superseded session: its sender halves are dropped from every map, the
//! transport observes the closed channel and terminates the old socket. This
//! replaces the silent last-writer-wins overwrite that left stale sessions
//! receiving duplicate or late deliveries.

use dashmap::DashMap;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::constants::rooms;
use crate::error::{CitasError, Result};
use crate::realtime::events::RealtimeEvent;

pub type SessionId = Uuid;

/// An authenticated actor holding a realtime connection. Identity, roles,
/// and permissions arrive resolved from the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub roles: Vec<String>,
    pub permissions: HashSet<String>,
}

impl Principal {
    pub fn new(id: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            id: id.into(),
            roles,
            permissions: HashSet::new(),
        }
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = String>) -> Self {
        self.permissions = permissions.into_iter().collect();
        self
    }

    pub fn identity_room(&self) -> String {
        format!("{}{}", rooms::USER_PREFIX, self.id)
    }

    /// Channel-access gate for ad-hoc rooms: the principal needs a read
    /// permission named after the channel.
    pub fn can_read_channel(&self, room: &str) -> bool {
        self.permissions.contains(&format!("read:{room}"))
    }
}

pub(crate) struct Session {
    pub principal: Principal,
    pub sender: mpsc::Sender<RealtimeEvent>,
}

pub struct ConnectionRegistry {
    sessions: DashMap<SessionId, Session>,
    /// principal id -> currently registered session.
    current: DashMap<String, SessionId>,
    rooms: DashMap<String, HashSet<SessionId>>,
    channel_capacity: usize,
}

impl ConnectionRegistry {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            current: DashMap::new(),
            rooms: DashMap::new(),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Register a transport session for a principal. Returns the session id
    /// and the receiving half handed to the transport. A previously
    /// registered session for the same principal is force-closed.
    pub fn connect(&self, principal: Principal) -> (SessionId, mpsc::Receiver<RealtimeEvent>) {
        if let Some((_, superseded)) = self.current.remove(&principal.id) {
            debug!(principal = %principal.id, session = %superseded, "force-closing superseded session");
            self.drop_session(superseded);
        }

        let session_id = Uuid::new_v4();
        let (sender, receiver) = mpsc::channel(self.channel_capacity);

        self.join(session_id, principal.identity_room());
        for role in &principal.roles {
            self.join(session_id, format!("{}{}", rooms::ROLE_PREFIX, role));
        }

        self.current.insert(principal.id.clone(), session_id);
        self.sessions.insert(session_id, Session { principal, sender });
        (session_id, receiver)
    }

    /// Remove a session on transport disconnect.
    pub fn disconnect(&self, session_id: SessionId) {
        if let Some((_, session)) = self.sessions.remove(&session_id) {
            self.current
                .remove_if(&session.principal.id, |_, current| *current == session_id);
        }
        self.remove_from_rooms(session_id);
    }

    /// Join an ad-hoc room on client request, gated by channel permission.
    /// Identity and role rooms are joined automatically on connect.
    pub fn join_room(&self, session_id: SessionId, room: &str) -> Result<()> {
        let session = self.sessions.get(&session_id).ok_or_else(|| {
            CitasError::NotFoundError(format!("session {session_id} is not connected"))
        })?;
        if !session.principal.can_read_channel(room) {
            return Err(CitasError::ValidationError(format!(
                "principal {} lacks read access to channel {room}",
                session.principal.id
            )));
        }
        drop(session);
        self.join(session_id, room.to_string());
        Ok(())
    }

    pub fn leave_room(&self, session_id: SessionId, room: &str) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(&session_id);
        }
    }

    fn join(&self, session_id: SessionId, room: String) {
        self.rooms.entry(room).or_default().insert(session_id);
    }

    fn drop_session(&self, session_id: SessionId) {
        self.sessions.remove(&session_id);
        self.remove_from_rooms(session_id);
    }

    fn remove_from_rooms(&self, session_id: SessionId) {
        for mut entry in self.rooms.iter_mut() {
            entry.value_mut().remove(&session_id);
        }
    }

    // ---- read-side, used by the hub's delivery primitives ----

    pub(crate) fn session_for_principal(&self, principal_id: &str) -> Option<SessionId> {
        self.current.get(principal_id).map(|entry| *entry.value())
    }

    pub(crate) fn room_members(&self, room: &str) -> Vec<SessionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn all_sessions(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    /// Try to push an event onto a session's channel. Best-effort: a full
    /// or closed channel drops the event.
    pub(crate) fn push(&self, session_id: SessionId, event: RealtimeEvent) -> bool {
        let Some(session) = self.sessions.get(&session_id) else {
            return false;
        };
        match session.sender.try_send(event) {
            Ok(()) => true,
            Err(err) => {
                debug!(session = %session_id, error = %err, "dropping realtime event");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator(id: &str) -> Principal {
        Principal::new(id, vec!["coordinator".to_string()])
    }

    #[tokio::test]
    async fn test_connect_joins_identity_and_role_rooms() {
        let registry = ConnectionRegistry::new(8);
        let (session_id, _rx) = registry.connect(coordinator("u1"));

        assert_eq!(registry.room_members("user:u1"), vec![session_id]);
        assert_eq!(registry.room_members("role:coordinator"), vec![session_id]);
    }

    #[tokio::test]
    async fn test_reconnect_force_closes_previous_session() {
        let registry = ConnectionRegistry::new(8);
        let (first, mut first_rx) = registry.connect(coordinator("u1"));
        let (second, _second_rx) = registry.connect(coordinator("u1"));

        assert_ne!(first, second);
        assert_eq!(registry.session_for_principal("u1"), Some(second));
        // The superseded session's channel is closed, not just overwritten.
        assert!(first_rx.recv().await.is_none());
        assert!(!registry.room_members("role:coordinator").contains(&first));
    }

    #[tokio::test]
    async fn test_ad_hoc_room_join_is_permission_gated() {
        let registry = ConnectionRegistry::new(8);
        let (ungated, _rx1) = registry.connect(coordinator("u1"));
        let err = registry
            .join_room(ungated, rooms::COORDINATORS)
            .expect_err("join should be rejected");
        assert!(matches!(err, CitasError::ValidationError(_)));

        let principal = coordinator("u2")
            .with_permissions([format!("read:{}", rooms::COORDINATORS)]);
        let (gated, _rx2) = registry.connect(principal);
        registry.join_room(gated, rooms::COORDINATORS).unwrap();
        assert!(registry.room_members(rooms::COORDINATORS).contains(&gated));
    }

    #[tokio::test]
    async fn test_disconnect_clears_membership() {
        let registry = ConnectionRegistry::new(8);
        let (session_id, _rx) = registry.connect(coordinator("u1"));
        registry.disconnect(session_id);

        assert_eq!(registry.session_for_principal("u1"), None);
        assert!(registry.room_members("user:u1").is_empty());
        assert!(registry.all_sessions().is_empty());
    }
}
