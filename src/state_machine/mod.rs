// State machine module for the task queue and the admission allow-list
//
// Task statuses advance monotonically through the lifecycle driven by the
// task queue; admission entries are promoted by task handlers and by
// joiner events from the commissioning subsystem.

pub mod outcome;
pub mod states;

// Re-export main types for convenient access
pub use outcome::HandlerOutcome;
pub use states::{EntryState, JoinStatus, TaskStatus};
