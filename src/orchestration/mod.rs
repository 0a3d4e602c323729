//! # Task Queue Engine
//!
//! Generic asynchronous task lifecycle management:
//!
//! - [`TaskQueue`]: bounded ordered collection with oldest-finished eviction
//! - [`TaskQueueDriver`]: the loop that advances tasks and enforces deadlines
//! - [`ProgressHandle`]: how launched activities report back
//! - [`TaskEngine`]: everything wired together behind one facade
//!
//! ```text
//! submit ──▶ TaskQueue ◀── TaskQueueDriver ──▶ TaskHandler
//!                ▲                                 │
//!                └────────── ProgressHandle ◀──────┘
//! ```

pub mod driver;
pub mod engine;
pub mod progress;
pub mod task_queue;

pub use driver::{PassSummary, TaskQueueDriver};
pub use engine::TaskEngine;
pub use progress::ProgressHandle;
pub use task_queue::{Enqueued, TaskQueue};
