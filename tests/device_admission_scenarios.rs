//! End-to-end admission scenarios through the task engine and a simulated
//! commissioner.

mod common;

use common::*;
use serde_json::json;
use std::time::Duration;
use tasker_admission::commissioner::{Activation, CommissionerCall, CommissionerState, JoinerEvent};
use tasker_admission::{DeviceId, EntryState, TaskStatus, TaskerError};

fn device() -> DeviceId {
    DeviceId::parse(DEVICE_EUI).unwrap()
}

#[tokio::test]
async fn test_active_commissioner_admits_device() {
    let (engine, simulated) = TestEngineBuilder::new().build();
    let id = engine.submit_json(&default_admission_request()).await.unwrap();
    assert_eq!(engine.queue().status(&id), Some(TaskStatus::Pending));

    engine.run_pass().await;
    assert_eq!(engine.queue().status(&id), Some(TaskStatus::Active));
    assert_eq!(simulated.joiners(), vec![Some(device())]);
    assert_eq!(
        engine.allow_list().find(&device()).unwrap().state,
        EntryState::ActiveJoiner
    );

    engine.run_pass().await;
    assert_eq!(engine.queue().status(&id), Some(TaskStatus::Completed));
    assert!(simulated.calls().contains(&CommissionerCall::AddJoiner {
        device_id: Some(device()),
        timeout_secs: 60,
    }));
}

#[tokio::test]
async fn test_late_activation_resumes_task() {
    let (engine, simulated) = TestEngineBuilder::new()
        .activation(Activation::AfterPolls(3))
        .build();
    let id = engine.submit_json(&default_admission_request()).await.unwrap();

    engine.run_pass().await;
    let task = engine.queue().find_task(&id).unwrap();
    assert_eq!(task.status, TaskStatus::Active);
    assert!(task.awaiting_activity);

    let status = drive_until(&engine, &id, TaskStatus::Completed, 100).await;
    assert_eq!(status, Some(TaskStatus::Completed));
    assert_eq!(simulated.joiners(), vec![Some(device())]);
}

#[tokio::test]
async fn test_commissioner_never_active_fails_task() {
    let (engine, simulated) = TestEngineBuilder::new()
        .activation(Activation::Manual)
        .build();
    let id = engine.submit_json(&default_admission_request()).await.unwrap();

    let status = drive_until(&engine, &id, TaskStatus::Failed, 100).await;
    assert_eq!(status, Some(TaskStatus::Failed));
    assert_eq!(simulated.count_calls(|c| matches!(c, CommissionerCall::AddJoiner { .. })), 0);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected_before_queueing() {
    let (engine, _) = TestEngineBuilder::new().build();

    let bad_credential = admission_request(DEVICE_EUI, "J01NMEo", json!(60));
    let bad_device = admission_request("00112233445566", JOIN_CRED, json!(60));
    let bad_timeout = admission_request(DEVICE_EUI, JOIN_CRED, json!("60"));
    let negative_timeout = admission_request(DEVICE_EUI, JOIN_CRED, json!(-1));
    let unknown_type = json!({"type": "rebootTask", "attributes": {"timeout": 5}});

    for request in [bad_credential, bad_device, bad_timeout, negative_timeout, unknown_type] {
        let err = engine.submit_json(&request).await.unwrap_err();
        assert!(matches!(err, TaskerError::ValidationError(_)), "{request}: {err}");
    }
    assert!(engine.queue().is_empty());
}

#[tokio::test]
async fn test_null_device_requires_allow_any_joiner() {
    let null_request = admission_request("0000000000000000", JOIN_CRED, json!(60));

    let (engine, _) = TestEngineBuilder::new().build();
    let id = engine.submit_json(&null_request).await.unwrap();
    engine.run_pass().await;
    assert_eq!(engine.queue().status(&id), Some(TaskStatus::Failed));

    let (engine, simulated) = TestEngineBuilder::new().allow_any_joiner().build();
    let id = engine.submit_json(&null_request).await.unwrap();
    engine.run_pass().await;
    engine.run_pass().await;
    assert_eq!(engine.queue().status(&id), Some(TaskStatus::Completed));
    assert_eq!(simulated.joiners(), vec![None]);
    assert!(engine.allow_list().is_empty());
}

#[tokio::test]
async fn test_second_admission_waits_for_the_first() {
    let (engine, simulated) = TestEngineBuilder::new()
        .activation(Activation::Manual)
        .build();
    let first = engine.submit_json(&default_admission_request()).await.unwrap();
    let second = engine
        .submit_json(&admission_request("8899aabbccddeeff", JOIN_CRED, json!(60)))
        .await
        .unwrap();

    engine.run_pass().await;
    assert_eq!(engine.queue().status(&first), Some(TaskStatus::Active));
    assert_eq!(engine.queue().status(&second), Some(TaskStatus::Pending));

    simulated.set_state(CommissionerState::Active);
    assert_eq!(
        drive_until(&engine, &first, TaskStatus::Completed, 100).await,
        Some(TaskStatus::Completed)
    );
    assert_eq!(
        drive_until(&engine, &second, TaskStatus::Completed, 100).await,
        Some(TaskStatus::Completed)
    );
    assert_eq!(simulated.joiners().len(), 2);
}

#[tokio::test]
async fn test_removing_task_releases_joiner() {
    let (engine, simulated) = TestEngineBuilder::new().build();
    let id = engine.submit_json(&default_admission_request()).await.unwrap();
    engine.run_pass().await;
    engine.run_pass().await;

    assert!(engine.remove(&id));
    assert!(engine.describe(&id).is_none());
    assert!(!engine.remove(&id));

    let summary = engine.run_pass().await;
    assert_eq!(summary.removed, 1);
    assert!(simulated.joiners().is_empty());
    assert!(engine.allow_list().find(&device()).is_none());
    assert!(engine.queue().is_empty());
}

#[tokio::test]
async fn test_timeout_stops_task_and_releases_joiner() {
    let (engine, simulated) = TestEngineBuilder::new()
        .activation(Activation::Manual)
        .build();
    let request = admission_request(DEVICE_EUI, JOIN_CRED, json!(0.02));
    let id = engine.submit_json(&request).await.unwrap();

    engine.run_pass().await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    engine.run_pass().await;

    assert_eq!(engine.queue().status(&id), Some(TaskStatus::Stopped));
    assert!(engine.allow_list().find(&device()).is_none());

    // the readiness watcher gives up later without touching the stopped task
    tokio::time::sleep(Duration::from_millis(60)).await;
    engine.run_pass().await;
    assert_eq!(engine.queue().status(&id), Some(TaskStatus::Stopped));
    assert!(simulated.joiners().is_empty());
}

#[tokio::test]
async fn test_late_activation_after_timeout_adds_no_joiner() {
    let (engine, simulated) = TestEngineBuilder::new()
        .activation(Activation::Manual)
        .build();
    let request = admission_request(DEVICE_EUI, JOIN_CRED, json!(0.02));
    let id = engine.submit_json(&request).await.unwrap();

    engine.run_pass().await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    engine.run_pass().await;
    assert_eq!(engine.queue().status(&id), Some(TaskStatus::Stopped));

    // commissioner comes up while the watcher is still polling
    simulated.set_state(CommissionerState::Active);
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert!(simulated.joiners().is_empty());
    assert!(engine.allow_list().find(&device()).is_none());
    assert_eq!(simulated.count_calls(|c| matches!(c, CommissionerCall::AddJoiner { .. })), 0);

    assert!(engine.remove(&id));
    engine.run_pass().await;
    assert!(engine.queue().is_empty());
    assert!(simulated.joiners().is_empty());
}

#[tokio::test]
async fn test_join_status_gates_completion() {
    let (engine, simulated) = TestEngineBuilder::new().evaluate_join_status().build();
    let id = engine.submit_json(&default_admission_request()).await.unwrap();

    engine.run_pass().await;
    engine.run_pass().await;
    assert_eq!(engine.queue().status(&id), Some(TaskStatus::Active));

    simulated.emit(JoinerEvent::Finalized, Some(device()));
    engine.run_pass().await;
    assert_eq!(engine.queue().status(&id), Some(TaskStatus::Completed));
    assert!(engine.allow_list().find(&device()).is_none());
}

#[tokio::test]
async fn test_join_status_failure_fails_task() {
    let (engine, simulated) = TestEngineBuilder::new().evaluate_join_status().build();
    let id = engine.submit_json(&default_admission_request()).await.unwrap();
    engine.run_pass().await;

    simulated.emit(JoinerEvent::Removed, Some(device()));
    engine.run_pass().await;

    assert_eq!(engine.queue().status(&id), Some(TaskStatus::Failed));
    assert_eq!(simulated.calls().last(), Some(&CommissionerCall::Stop));
}

#[tokio::test]
async fn test_describe_hides_join_credential() {
    let (engine, _) = TestEngineBuilder::new().build();
    let id = engine.submit_json(&default_admission_request()).await.unwrap();

    let snapshot = engine.describe(&id).unwrap();
    let rendered = snapshot.to_json();
    assert_eq!(rendered["type"], json!("addThreadDeviceTask"));
    assert_eq!(rendered["attributes"]["status"], json!("pending"));
    assert_eq!(rendered["attributes"]["hasActivationKey"]["eui"], json!(DEVICE_EUI));
    assert!(rendered["attributes"]["hasActivationKey"].get("joinCred").is_none());
    assert_eq!(rendered["timeout"], json!(snapshot.created + 60));

    let (page, meta) = engine.list(0, 10);
    assert_eq!(page.len(), 1);
    assert_eq!(meta.collection.total, 1);
}

#[tokio::test]
async fn test_full_engine_evicts_finished_task() {
    let (engine, _) = TestEngineBuilder::new().max_tasks(1).build();
    let failed = engine
        .submit_json(&admission_request("0000000000000000", JOIN_CRED, json!(60)))
        .await
        .unwrap();
    engine.run_pass().await;
    assert_eq!(engine.queue().status(&failed), Some(TaskStatus::Failed));

    let next = engine.submit_json(&default_admission_request()).await.unwrap();
    assert!(engine.describe(&failed).is_none());
    assert_eq!(engine.queue().status(&next), Some(TaskStatus::Pending));
}

#[tokio::test]
async fn test_engine_background_driver() {
    let (engine, _) = TestEngineBuilder::new().build();
    engine.start().unwrap();
    let id = engine.submit_json(&default_admission_request()).await.unwrap();

    for _ in 0..100 {
        if engine.queue().status(&id) == Some(TaskStatus::Completed) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    engine.stop().await.unwrap();
    assert_eq!(engine.queue().status(&id), Some(TaskStatus::Completed));
}

#[tokio::test]
async fn test_concurrent_submissions_respect_capacity() {
    let (engine, _) = TestEngineBuilder::new().max_tasks(4).build();
    let requests: Vec<_> = (0..8)
        .map(|n| admission_request(&format!("00112233445566{n:02x}"), JOIN_CRED, json!(60)))
        .collect();

    let results =
        futures::future::join_all(requests.iter().map(|request| engine.submit_json(request)))
            .await;

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(TaskerError::CapacityError(_))))
        .count();
    assert_eq!(accepted, 4);
    assert_eq!(rejected, 4);
    assert_eq!(engine.queue().len(), 4);
}
