//! Assignment manager: symmetric notify-old/notify-new semantics and
//! failure isolation between the two notification legs.

mod common;

use common::{order_request, test_env};

use citas_core::database::InspectionStore;
use citas_core::error::CitasError;
use citas_core::models::NotificationStatus;

#[tokio::test]
async fn first_assignment_notifies_new_agent_only() {
    let env = test_env();
    let order = env
        .store
        .create_order(order_request("ORD-300", "GGG-300"))
        .await
        .unwrap();

    let updated = env.assignment.assign_agent(order.id, Some(7)).await.unwrap();
    assert_eq!(updated.assigned_agent_id, Some(7));

    let recipients: Vec<String> = env
        .sink
        .attempts()
        .into_iter()
        .map(|(recipient, _)| recipient)
        .collect();
    assert_eq!(recipients, vec!["agent:7".to_string()]);
}

#[tokio::test]
async fn reassignment_notifies_both_agents() {
    let env = test_env();
    let order = env
        .store
        .create_order(order_request("ORD-301", "GGG-301"))
        .await
        .unwrap();

    env.assignment.assign_agent(order.id, Some(7)).await.unwrap();
    env.assignment.assign_agent(order.id, Some(8)).await.unwrap();

    let recipients: Vec<String> = env
        .sink
        .attempts()
        .into_iter()
        .map(|(recipient, _)| recipient)
        .collect();
    // First assignment, then removal->7 and reassignment->8.
    assert_eq!(
        recipients,
        vec![
            "agent:7".to_string(),
            "agent:7".to_string(),
            "agent:8".to_string()
        ]
    );
}

#[tokio::test]
async fn removal_failure_does_not_block_assignment_notice() {
    let env = test_env();
    let order = env
        .store
        .create_order(order_request("ORD-302", "GGG-302"))
        .await
        .unwrap();
    env.assignment.assign_agent(order.id, Some(7)).await.unwrap();

    // Force the removal leg to fail at the transport.
    env.sink.fail_for("agent:7");
    let updated = env.assignment.assign_agent(order.id, Some(8)).await.unwrap();
    assert_eq!(updated.assigned_agent_id, Some(8));

    // The assignment leg was still attempted and succeeded.
    let attempts = env.sink.attempts();
    assert!(attempts.iter().any(|(r, _)| r == "agent:8"));

    let rows = env.store.notifications_snapshot();
    let removal = rows
        .iter()
        .rev()
        .find(|n| n.recipient == "agent:7")
        .expect("removal row persisted");
    assert_eq!(removal.status, NotificationStatus::Failed);
    let assignment = rows
        .iter()
        .find(|n| n.recipient == "agent:8")
        .expect("assignment row persisted");
    assert_eq!(assignment.status, NotificationStatus::Sent);
}

#[tokio::test]
async fn clearing_assignment_notifies_previous_agent_only() {
    let env = test_env();
    let order = env
        .store
        .create_order(order_request("ORD-303", "GGG-303"))
        .await
        .unwrap();
    env.assignment.assign_agent(order.id, Some(7)).await.unwrap();

    let updated = env.assignment.assign_agent(order.id, None).await.unwrap();
    assert_eq!(updated.assigned_agent_id, None);

    let recipients: Vec<String> = env
        .sink
        .attempts()
        .into_iter()
        .map(|(recipient, _)| recipient)
        .collect();
    assert_eq!(
        recipients,
        vec!["agent:7".to_string(), "agent:7".to_string()]
    );
}

#[tokio::test]
async fn reassigning_same_agent_is_quiet() {
    let env = test_env();
    let order = env
        .store
        .create_order(order_request("ORD-304", "GGG-304"))
        .await
        .unwrap();
    env.assignment.assign_agent(order.id, Some(7)).await.unwrap();
    env.assignment.assign_agent(order.id, Some(7)).await.unwrap();

    assert_eq!(env.sink.attempts().len(), 1);
}

#[tokio::test]
async fn unknown_order_reports_not_found() {
    let env = test_env();
    let err = env.assignment.assign_agent(424242, Some(7)).await.unwrap_err();
    assert!(matches!(err, CitasError::NotFoundError(_)));
}
