//! Shared fixtures for the coordination-engine integration tests.
#![allow(dead_code)] // not every test binary uses every fixture

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use citas_core::config::CitasConfig;
use citas_core::database::{InspectionStore, MemoryStore};
use citas_core::models::{Channel, NewInspectionOrder, NewQueueEntry};
use citas_core::notifications::{ChannelSink, NotificationDispatcher, SinkError};
use citas_core::orchestration::{AppointmentLifecycleManager, AssignmentManager, QueueReconciler};
use citas_core::realtime::RealtimeHub;
use citas_core::state_machine::OrderSource;

/// Sink that records every delivery attempt and fails for configured
/// recipients, for failure-isolation assertions.
#[derive(Default)]
pub struct RecordingSink {
    fail_for: Mutex<Vec<String>>,
    attempts: Mutex<Vec<(String, Channel)>>,
}

impl RecordingSink {
    pub fn fail_for(&self, recipient: &str) {
        self.fail_for.lock().push(recipient.to_string());
    }

    pub fn attempts(&self) -> Vec<(String, Channel)> {
        self.attempts.lock().clone()
    }
}

#[async_trait]
impl ChannelSink for RecordingSink {
    async fn send(
        &self,
        recipient: &str,
        _content: &str,
        channel: Channel,
        _priority: i32,
        _metadata: Option<&serde_json::Value>,
    ) -> Result<(), SinkError> {
        self.attempts.lock().push((recipient.to_string(), channel));
        if self.fail_for.lock().iter().any(|r| r == recipient) {
            return Err(SinkError::Transport("forced failure".to_string()));
        }
        Ok(())
    }
}

pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub hub: RealtimeHub,
    pub sink: Arc<RecordingSink>,
    pub lifecycle: Arc<AppointmentLifecycleManager>,
    pub reconciler: QueueReconciler,
    pub assignment: AssignmentManager,
}

pub fn test_env() -> TestEnv {
    let store = Arc::new(MemoryStore::new());
    let store_dyn: Arc<dyn InspectionStore> = store.clone();
    let hub = RealtimeHub::with_capacity(16);
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = Arc::new(NotificationDispatcher::new(store_dyn.clone(), sink.clone()));

    let lifecycle = Arc::new(AppointmentLifecycleManager::new(
        store_dyn.clone(),
        hub.clone(),
        dispatcher.clone(),
        CitasConfig::default(),
    ));
    let reconciler = QueueReconciler::new(store_dyn.clone());
    let assignment = AssignmentManager::new(store_dyn, hub.clone(), dispatcher);

    TestEnv {
        store,
        hub,
        sink,
        lifecycle,
        reconciler,
        assignment,
    }
}

pub fn order_request(number: &str, plate: &str) -> NewInspectionOrder {
    NewInspectionOrder {
        order_number: number.to_string(),
        client_name: "Carla Mendez".to_string(),
        client_email: Some("carla@example.com".to_string()),
        client_phone: Some("+57-300-555-0101".to_string()),
        vehicle_plate: plate.to_string(),
        vehicle_brand: Some("Chevrolet".to_string()),
        vehicle_model: Some("Onix".to_string()),
        source: OrderSource::Direct,
        intermediary_key: None,
    }
}

pub fn queue_request(order_id: i64, prioridad: i32) -> NewQueueEntry {
    NewQueueEntry {
        order_id,
        prioridad,
        tiempo_ingreso: None,
    }
}
