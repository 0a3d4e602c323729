//! # Device Admission Handler
//!
//! Handler for `addThreadDeviceTask`: admits one device onto the network
//! through the commissioning subsystem.
//!
//! Request attributes:
//!
//! ```json
//! {
//!   "timeout": 60,
//!   "hasActivationKey": { "eui": "0011223344556677", "joinCred": "J01NME" }
//! }
//! ```
//!
//! Begin-processing claims the process-wide admission slot, starts the
//! commissioner and adds the joiner. If the commissioner is not active yet a
//! readiness watcher is spawned that polls until the configured deadline;
//! the task stays active without evaluation until the watcher reports back.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::slot::{AdmissionPermit, AdmissionSlot};
use crate::commissioner::CommissioningService;
use crate::config::AdmissionConfig;
use crate::constants::attributes;
use crate::error::{Result, TaskerError};
use crate::models::{DeviceId, JoinCredential, Task, TaskSnapshot};
use crate::orchestration::ProgressHandle;
use crate::registry::{TaskContext, TaskHandler, TaskType};
use crate::state_machine::{HandlerOutcome, JoinStatus};

/// Joiner parameters extracted from validated attributes
#[derive(Debug, Clone)]
struct JoinerRequest {
    device_id: DeviceId,
    credential: JoinCredential,
    timeout_secs: u32,
}

pub struct AddThreadDeviceHandler {
    commissioning: Arc<CommissioningService>,
    settings: AdmissionConfig,
    slot: Arc<AdmissionSlot>,
}

impl AddThreadDeviceHandler {
    pub fn new(commissioning: Arc<CommissioningService>, settings: AdmissionConfig) -> Self {
        Self {
            commissioning,
            settings,
            slot: Arc::new(AdmissionSlot::new()),
        }
    }

    pub fn slot(&self) -> &Arc<AdmissionSlot> {
        &self.slot
    }

    fn spawn_readiness_watch(
        &self,
        joiner: JoinerRequest,
        progress: ProgressHandle,
        permit: AdmissionPermit,
    ) {
        let commissioning = self.commissioning.clone();
        let poll_interval = Duration::from_millis(self.settings.readiness_poll_interval_ms);
        let deadline = Duration::from_millis(self.settings.readiness_deadline_ms);

        tokio::spawn(async move {
            let _permit = permit;
            let task_id = progress.task_id();

            if let Err(error) = wait_until_active(&commissioning, poll_interval, deadline).await {
                warn!(task_id = %task_id, error = %error, "⏰ ADMISSION: Joiner failed");
                progress.fail();
                return;
            }

            // the add happens under the task's liveness check, so a task that
            // timed out or was removed meanwhile never gets a joiner
            let settled = tokio::task::spawn_blocking(move || {
                progress.settle(|| match commissioning.add_joiner(
                    joiner.device_id,
                    joiner.timeout_secs,
                    &joiner.credential,
                ) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(task_id = %task_id, error = %e, "❌ ADMISSION: Joiner add failed");
                        false
                    }
                })
            })
            .await;

            match settled {
                Ok(Some(true)) => info!(task_id = %task_id, "📡 ADMISSION: Joiner added"),
                Ok(Some(false)) => {}
                Ok(None) => info!(task_id = %task_id, "Task no longer waiting, joiner not added"),
                Err(e) => warn!(task_id = %task_id, error = %e, "Joiner add did not complete"),
            }
        });
    }
}

/// Start the commissioner and add the joiner if it is already active.
/// `Ok(false)` means the commissioner is still coming up.
fn begin_admission(commissioning: &CommissioningService, joiner: &JoinerRequest) -> Result<bool> {
    commissioning.start_commissioner()?;
    if !commissioning.state().is_active() {
        return Ok(false);
    }
    commissioning.add_joiner(joiner.device_id, joiner.timeout_secs, &joiner.credential)?;
    Ok(true)
}

/// Transient errors are retried on a later pass; everything else fails the task
fn outcome_for(error: &TaskerError) -> HandlerOutcome {
    if error.is_transient() {
        HandlerOutcome::Retry
    } else {
        HandlerOutcome::Failure
    }
}

/// Run subsystem calls off the async workers; the gate blocks
async fn off_runtime<T: Send + 'static>(
    call: impl FnOnce() -> Result<T> + Send + 'static,
) -> Result<T> {
    tokio::task::spawn_blocking(call).await.map_err(|e| {
        TaskerError::SubsystemError(format!("Commissioner call did not complete: {e}"))
    })?
}

async fn wait_until_active(
    commissioning: &Arc<CommissioningService>,
    poll_interval: Duration,
    deadline: Duration,
) -> Result<()> {
    let started = Instant::now();
    loop {
        tokio::time::sleep(poll_interval).await;
        let service = commissioning.clone();
        let state = off_runtime(move || Ok(service.state())).await?;
        if state.is_active() {
            return Ok(());
        }
        if started.elapsed() >= deadline {
            return Err(TaskerError::TimeoutError(format!(
                "Commissioner still {state} after {deadline:?}"
            )));
        }
    }
}

fn activation_key(attributes: &Value) -> Result<&Value> {
    attributes
        .get(attributes::ACTIVATION_KEY)
        .filter(|key| key.is_object())
        .ok_or_else(|| {
            TaskerError::ValidationError(format!(
                "Missing '{}' object",
                attributes::ACTIVATION_KEY
            ))
        })
}

fn device_id_of(attributes: &Value) -> Result<DeviceId> {
    let eui = activation_key(attributes)?
        .get(attributes::DEVICE_ID)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            TaskerError::ValidationError(format!("Missing '{}' string", attributes::DEVICE_ID))
        })?;
    DeviceId::parse(eui)
}

/// Whole seconds handed to the commissioner, rounded up
fn timeout_secs_of(attributes: &Value) -> Result<u32> {
    let timeout = attributes
        .get(attributes::TIMEOUT)
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            TaskerError::ValidationError(format!("Missing numeric '{}'", attributes::TIMEOUT))
        })?;
    if !timeout.is_finite() || timeout < 0.0 || timeout.ceil() > f64::from(u32::MAX) {
        return Err(TaskerError::ValidationError(format!(
            "Timeout {timeout} is out of range"
        )));
    }
    Ok(timeout.ceil() as u32)
}

fn parse_joiner(attributes: &Value) -> Result<JoinerRequest> {
    let timeout_secs = timeout_secs_of(attributes)?;
    let device_id = device_id_of(attributes)?;
    let raw_credential = activation_key(attributes)?
        .get(attributes::JOIN_CREDENTIAL)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            TaskerError::ValidationError(format!(
                "Missing '{}' string",
                attributes::JOIN_CREDENTIAL
            ))
        })?;
    let credential = JoinCredential::parse(raw_credential)?;

    Ok(JoinerRequest {
        device_id,
        credential,
        timeout_secs,
    })
}

#[async_trait]
impl TaskHandler for AddThreadDeviceHandler {
    fn task_type(&self) -> TaskType {
        TaskType::AddThreadDevice
    }

    /// Snapshot with the join credential stripped
    fn describe(&self, task: &Task) -> TaskSnapshot {
        let mut snapshot = task.snapshot();
        if let Some(key) = snapshot
            .attributes
            .get_mut(attributes::ACTIVATION_KEY)
            .and_then(Value::as_object_mut)
        {
            key.remove(attributes::JOIN_CREDENTIAL);
        }
        snapshot
    }

    fn validate(&self, attributes: &Value) -> Result<()> {
        parse_joiner(attributes).map(|_| ()).map_err(|e| {
            warn!(error = %e, "addThreadDeviceTask rejected");
            e
        })
    }

    #[instrument(skip(self, ctx), fields(task_id = %ctx.task.id))]
    async fn process(&self, ctx: TaskContext) -> HandlerOutcome {
        let Some(permit) = self.slot.try_acquire() else {
            let busy = TaskerError::ConcurrentAccessError(
                "device admission already in flight".to_string(),
            );
            debug!(error = %busy, "Retrying later");
            return outcome_for(&busy);
        };

        let joiner = match parse_joiner(ctx.attributes()) {
            Ok(joiner) => joiner,
            Err(e) => {
                warn!(error = %e, "❌ ADMISSION: Unusable task attributes");
                return outcome_for(&e);
            }
        };

        let commissioning = self.commissioning.clone();
        let request = joiner.clone();
        match off_runtime(move || begin_admission(&commissioning, &request)).await {
            Ok(true) => {
                info!(device_id = %joiner.device_id, "📡 ADMISSION: Joiner added");
                HandlerOutcome::Success
            }
            Ok(false) => {
                info!(
                    device_id = %joiner.device_id,
                    "⏳ ADMISSION: Waiting for commissioner to become active"
                );
                self.spawn_readiness_watch(joiner, ctx.progress.clone(), permit);
                HandlerOutcome::Pending
            }
            Err(e) => {
                warn!(device_id = %joiner.device_id, error = %e, "❌ ADMISSION: Commissioner rejected admission");
                outcome_for(&e)
            }
        }
    }

    async fn evaluate(&self, ctx: TaskContext) -> HandlerOutcome {
        if !self.settings.evaluate_join_status {
            return HandlerOutcome::Success;
        }

        let device_id = match device_id_of(ctx.attributes()) {
            Ok(device_id) => device_id,
            Err(_) => return HandlerOutcome::Failure,
        };
        let allow_list = self.commissioning.allow_list();
        match allow_list.join_status(&device_id) {
            JoinStatus::Succeeded => {
                allow_list.erase(&device_id);
                HandlerOutcome::Success
            }
            JoinStatus::Failed | JoinStatus::NotFound => HandlerOutcome::Failure,
            JoinStatus::Pending => HandlerOutcome::Pending,
        }
    }

    async fn clean(&self, ctx: TaskContext) -> HandlerOutcome {
        let device_id = match device_id_of(ctx.attributes()) {
            Ok(device_id) => device_id,
            Err(_) => return HandlerOutcome::Failure,
        };

        let commissioning = self.commissioning.clone();
        let removed = off_runtime(move || {
            let removed = commissioning.remove_joiner(device_id);
            commissioning.allow_list().erase(&device_id);
            removed.map_err(TaskerError::from)
        })
        .await;

        match removed {
            Ok(()) => HandlerOutcome::Success,
            Err(e) => {
                warn!(device_id = %device_id, error = %e, "Joiner clean-up failed");
                HandlerOutcome::Failure
            }
        }
    }
}

impl std::fmt::Debug for AddThreadDeviceHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddThreadDeviceHandler")
            .field("settings", &self.settings)
            .field("slot", &self.slot)
            .finish()
    }
}
