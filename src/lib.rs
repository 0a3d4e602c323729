#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Tasker Admission
//!
//! In-process asynchronous task queue with a device admission workflow for
//! network commissioning services.
//!
//! ## Overview
//!
//! Callers submit typed tasks to a bounded queue. A single background driver
//! walks the queue and advances every task through its handler: `process`
//! starts work, `evaluate` decides completion, `clean` releases resources once
//! a task is removed or times out. Requests never block on device I/O.
//!
//! The only task type shipped is `addThreadDeviceTask`, which admits a device
//! to the network by placing its identity and join credential on an
//! allow-list and registering it with the commissioner.
//!
//! ## Module Organization
//!
//! - [`orchestration`] - Task queue, driver loop and the engine facade
//! - [`registry`] - Task types and the handler registry
//! - [`handlers`] - Device admission handler
//! - [`allow_list`] - Devices permitted to join and their join state
//! - [`commissioner`] - Commissioner capability, gate and simulator
//! - [`sync`] - Exclusive region primitive
//! - [`models`] - Tasks, device identities and join credentials
//! - [`state_machine`] - Task, entry and outcome states
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tasker_admission::commissioner::{Activation, SimulatedCommissioner};
//! use tasker_admission::config::EngineConfig;
//! use tasker_admission::orchestration::TaskEngine;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let commissioner = SimulatedCommissioner::new(Activation::Immediate);
//! let engine = TaskEngine::new(EngineConfig::default(), Box::new(commissioner))?;
//! engine.start()?;
//!
//! let id = engine
//!     .submit_json(&json!({
//!         "type": "addThreadDeviceTask",
//!         "attributes": {
//!             "timeout": 60,
//!             "hasActivationKey": { "eui": "0011223344556677", "joinCred": "J01NME" }
//!         }
//!     }))
//!     .await?;
//! println!("queued {id}");
//!
//! engine.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod allow_list;
pub mod commissioner;
pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod identifier;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod registry;
pub mod state_machine;
pub mod sync;

pub use allow_list::{AllowList, AllowListEntry};
pub use commissioner::{Commissioner, CommissionerState, CommissioningService, JoinerEvent};
pub use config::{ConfigManager, EngineConfig};
pub use error::{Result, TaskerError};
pub use identifier::Identifier;
pub use models::{DeviceId, JoinCredential, Task, TaskRequest, TaskSnapshot};
pub use orchestration::{TaskEngine, TaskQueue, TaskQueueDriver};
pub use registry::{TaskHandler, TaskHandlerRegistry, TaskType};
pub use state_machine::{EntryState, HandlerOutcome, JoinStatus, TaskStatus};
pub use sync::{ExclusiveRegion, LockMode};
