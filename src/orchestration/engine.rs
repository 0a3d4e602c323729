//! # Task Engine
//!
//! Wires the pieces together: configuration, allow-list, commissioning
//! service, handler registry, task queue and driver. This is the surface
//! the request layer talks to.
//!
//! ```rust,no_run
//! use tasker_admission::commissioner::{Activation, SimulatedCommissioner};
//! use tasker_admission::config::EngineConfig;
//! use tasker_admission::orchestration::TaskEngine;
//! use serde_json::json;
//!
//! # async fn example() -> tasker_admission::error::Result<()> {
//! let commissioner = SimulatedCommissioner::new(Activation::Immediate);
//! let engine = TaskEngine::new(EngineConfig::default(), Box::new(commissioner))?;
//! engine.start()?;
//!
//! let id = engine
//!     .submit_json(&json!({
//!         "type": "addThreadDeviceTask",
//!         "attributes": {
//!             "timeout": 60,
//!             "hasActivationKey": {"eui": "0011223344556677", "joinCred": "J01NME"}
//!         }
//!     }))
//!     .await?;
//! let snapshot = engine.describe(&id);
//! engine.stop().await?;
//! # Ok(())
//! # }
//! ```

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use super::driver::{PassSummary, TaskQueueDriver};
use super::task_queue::TaskQueue;
use crate::allow_list::AllowList;
use crate::commissioner::{Commissioner, CommissioningService};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::handlers::AddThreadDeviceHandler;
use crate::identifier::Identifier;
use crate::models::{PagingMeta, TaskRequest, TaskSnapshot};
use crate::registry::TaskHandlerRegistry;

#[derive(Debug)]
pub struct TaskEngine {
    config: EngineConfig,
    allow_list: Arc<AllowList>,
    commissioning: Arc<CommissioningService>,
    registry: Arc<TaskHandlerRegistry>,
    queue: Arc<TaskQueue>,
    driver: TaskQueueDriver,
}

impl TaskEngine {
    /// Build an engine around a commissioning subsystem; the driver is not started
    pub fn new(config: EngineConfig, commissioner: Box<dyn Commissioner>) -> Result<Self> {
        config.validate()?;

        let allow_list = Arc::new(AllowList::new());
        let commissioning = Arc::new(CommissioningService::new(
            commissioner,
            allow_list.clone(),
            config.admission.allow_any_joiner,
        ));

        let mut registry = TaskHandlerRegistry::new();
        registry.register(Arc::new(AddThreadDeviceHandler::new(
            commissioning.clone(),
            config.admission.clone(),
        )));
        registry.verify_complete()?;
        let registry = Arc::new(registry);

        let queue = Arc::new(TaskQueue::new(
            config.task_queue.max_tasks,
            registry.clone(),
        ));
        let driver = TaskQueueDriver::new(
            queue.clone(),
            Duration::from_millis(config.task_queue.tick_interval_ms),
        );

        info!(
            max_tasks = config.task_queue.max_tasks,
            allow_any_joiner = config.admission.allow_any_joiner,
            "🏗️ ENGINE: Task engine assembled"
        );

        Ok(Self {
            config,
            allow_list,
            commissioning,
            registry,
            queue,
            driver,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn allow_list(&self) -> &Arc<AllowList> {
        &self.allow_list
    }

    pub fn commissioning(&self) -> &Arc<CommissioningService> {
        &self.commissioning
    }

    pub fn registry(&self) -> &Arc<TaskHandlerRegistry> {
        &self.registry
    }

    pub fn queue(&self) -> &Arc<TaskQueue> {
        &self.queue
    }

    pub fn driver(&self) -> &TaskQueueDriver {
        &self.driver
    }

    /// Validate and queue a parsed request
    #[instrument(skip(self, request), fields(task_type = %request.task_type))]
    pub async fn submit(&self, request: &TaskRequest) -> Result<Identifier> {
        self.registry.validate(request)?;
        let enqueued = self.queue.queue_request(request)?;
        if enqueued.evicted.is_some() {
            // let the driver reach the evicted task before the caller moves on
            tokio::time::sleep(Duration::from_millis(
                self.config.task_queue.eviction_grace_ms,
            ))
            .await;
        }
        Ok(enqueued.id)
    }

    /// Validate and queue a raw JSON request object
    pub async fn submit_json(&self, request: &Value) -> Result<Identifier> {
        let request = self.registry.validate_request(request)?;
        self.submit(&request).await
    }

    pub fn describe(&self, id: &Identifier) -> Option<TaskSnapshot> {
        self.queue.describe(id)
    }

    pub fn list(&self, offset: usize, limit: usize) -> (Vec<TaskSnapshot>, PagingMeta) {
        (
            self.queue.list(offset, limit),
            self.queue.collection_meta(offset, limit),
        )
    }

    pub fn remove(&self, id: &Identifier) -> bool {
        self.queue.remove_task(id)
    }

    pub fn start(&self) -> Result<()> {
        self.driver.start()
    }

    pub async fn stop(&self) -> Result<()> {
        self.driver.stop().await
    }

    /// Run one driver pass without the background loop
    pub async fn run_pass(&self) -> PassSummary {
        self.driver.run_pass().await
    }
}
