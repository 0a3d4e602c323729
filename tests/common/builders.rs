//! Engine and request builders shared by the integration tests.

use serde_json::{json, Value};
use std::time::Duration;
use tasker_admission::commissioner::{Activation, SimulatedCommissioner};
use tasker_admission::config::{AdmissionConfig, EngineConfig, TaskQueueConfig};
use tasker_admission::orchestration::TaskEngine;
use tasker_admission::TaskStatus;

pub const DEVICE_EUI: &str = "0011223344556677";
pub const JOIN_CRED: &str = "J01NME";

/// Configuration with fast readiness polling so scenarios finish quickly
pub fn fast_config() -> EngineConfig {
    EngineConfig {
        task_queue: TaskQueueConfig {
            max_tasks: 10,
            tick_interval_ms: 1,
            eviction_grace_ms: 10,
        },
        admission: AdmissionConfig {
            readiness_poll_interval_ms: 5,
            readiness_deadline_ms: 50,
            ..AdmissionConfig::default()
        },
        ..EngineConfig::default()
    }
}

pub struct TestEngineBuilder {
    config: EngineConfig,
    activation: Activation,
}

impl Default for TestEngineBuilder {
    fn default() -> Self {
        Self {
            config: fast_config(),
            activation: Activation::Immediate,
        }
    }
}

impl TestEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn max_tasks(mut self, max_tasks: usize) -> Self {
        self.config.task_queue.max_tasks = max_tasks;
        self
    }

    pub fn allow_any_joiner(mut self) -> Self {
        self.config.admission.allow_any_joiner = true;
        self
    }

    pub fn evaluate_join_status(mut self) -> Self {
        self.config.admission.evaluate_join_status = true;
        self
    }

    pub fn build(self) -> (TaskEngine, SimulatedCommissioner) {
        let simulated = SimulatedCommissioner::new(self.activation);
        let engine = TaskEngine::new(self.config, Box::new(simulated.clone()))
            .expect("test engine configuration is valid");
        (engine, simulated)
    }
}

pub fn admission_request(eui: &str, join_cred: &str, timeout: Value) -> Value {
    json!({
        "type": "addThreadDeviceTask",
        "attributes": {
            "timeout": timeout,
            "hasActivationKey": { "eui": eui, "joinCred": join_cred }
        }
    })
}

pub fn default_admission_request() -> Value {
    admission_request(DEVICE_EUI, JOIN_CRED, json!(60))
}

/// Run driver passes until the task reaches `status` or the attempts run out
pub async fn drive_until(
    engine: &TaskEngine,
    id: &tasker_admission::Identifier,
    status: TaskStatus,
    attempts: usize,
) -> Option<TaskStatus> {
    for _ in 0..attempts {
        engine.run_pass().await;
        let current = engine.queue().status(id);
        if current == Some(status) {
            return current;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    engine.queue().status(id)
}
