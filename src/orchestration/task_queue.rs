//! # Task Queue
//!
//! Ordered, bounded collection of in-flight tasks. Insertion order is the
//! order the driver visits tasks in. Every read and mutation happens under
//! the queue's exclusive region in blocking mode; handler operations run
//! with the region released.
//!
//! ## Capacity
//!
//! At most `max_tasks` live tasks are held. When full, the terminal task
//! with the oldest creation time is flagged for deletion to make room; if
//! no task is terminal the enqueue fails with a capacity error. Running
//! work is never evicted.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::constants::status_groups;
use crate::error::{Result, TaskerError};
use crate::identifier::Identifier;
use crate::logging::log_task_operation;
use crate::models::{PagingMeta, Task, TaskRequest, TaskSnapshot};
use crate::registry::{TaskHandlerRegistry, TaskType};
use crate::state_machine::{HandlerOutcome, TaskStatus};
use crate::sync::ExclusiveRegion;

/// Result of a successful enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enqueued {
    pub id: Identifier,
    /// Terminal task flagged for deletion to make room, if any
    pub evicted: Option<Identifier>,
}

/// Work the driver has to do for one task, decided under the region
#[derive(Debug, Clone)]
pub(crate) enum VisitPlan {
    /// Flagged for deletion: clean up (unless already done), then unlink
    Remove { task: Task, clean: bool },
    /// Deadline passed while non-terminal: clean up, then stop
    Expire(Task),
    /// Was pending, now active: begin processing
    Process(Task),
    /// Active and not waiting on an activity: evaluate progress
    Evaluate(Task),
}

#[derive(Debug)]
pub struct TaskQueue {
    tasks: ExclusiveRegion<Vec<Task>>,
    max_tasks: usize,
    registry: Arc<TaskHandlerRegistry>,
}

impl TaskQueue {
    pub fn new(max_tasks: usize, registry: Arc<TaskHandlerRegistry>) -> Self {
        Self {
            tasks: ExclusiveRegion::new("task_queue", Vec::new()),
            max_tasks,
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<TaskHandlerRegistry> {
        &self.registry
    }

    pub fn max_tasks(&self) -> usize {
        self.max_tasks
    }

    /// Queue a task, returning its fresh identifier
    pub fn queue_task(&self, task_type: TaskType, attributes: Value) -> Result<Identifier> {
        self.enqueue(task_type, attributes).map(|enqueued| enqueued.id)
    }

    /// Queue a parsed request; validation is the caller's job
    pub fn queue_request(&self, request: &TaskRequest) -> Result<Enqueued> {
        let task_type = TaskType::from_name(&request.task_type).ok_or_else(|| {
            TaskerError::ValidationError(format!("Unknown task type '{}'", request.task_type))
        })?;
        self.enqueue(task_type, request.attributes.clone())
    }

    #[instrument(skip(self, attributes))]
    pub fn enqueue(&self, task_type: TaskType, attributes: Value) -> Result<Enqueued> {
        let now = Utc::now();
        let mut tasks = self.tasks.lock();

        let live = tasks.iter().filter(|t| t.is_live()).count();
        let mut evicted = None;
        if live >= self.max_tasks {
            let oldest = tasks
                .iter_mut()
                .filter(|t| t.is_live() && t.is_removable())
                .min_by_key(|t| t.created_at);
            match oldest {
                Some(task) => {
                    task.delete_requested = true;
                    info!(
                        evicted_task_id = %task.id,
                        status = %task.status,
                        "🧹 TASK_QUEUE: Evicting oldest finished task to make room"
                    );
                    evicted = Some(task.id);
                }
                None => {
                    warn!(
                        max_tasks = self.max_tasks,
                        "⚠️ TASK_QUEUE: Queue full and no finished task can be evicted"
                    );
                    return Err(TaskerError::CapacityError(format!(
                        "Task queue holds {live} of {} tasks and none are finished",
                        self.max_tasks
                    )));
                }
            }
        }

        let task = Task::new(task_type, attributes, now);
        let id = task.id;
        log_task_operation("queued", &id, task_type, task.status, None);
        tasks.push(task);
        Ok(Enqueued { id, evicted })
    }

    /// Clone of a live task
    pub fn find_task(&self, id: &Identifier) -> Option<Task> {
        let tasks = self.tasks.lock();
        tasks.iter().find(|t| &t.id == id && t.is_live()).cloned()
    }

    pub fn status(&self, id: &Identifier) -> Option<TaskStatus> {
        self.find_task(id).map(|t| t.status)
    }

    /// Caller-facing snapshot produced by the task type's handler
    pub fn describe(&self, id: &Identifier) -> Option<TaskSnapshot> {
        let task = self.find_task(id)?;
        self.describe_task(&task)
    }

    fn describe_task(&self, task: &Task) -> Option<TaskSnapshot> {
        match self.registry.get(task.task_type) {
            Some(handler) => Some(handler.describe(task)),
            None => {
                warn!(task_type = %task.task_type, "No handler to describe task");
                None
            }
        }
    }

    /// Snapshots of live tasks in queue order
    pub fn list(&self, offset: usize, limit: usize) -> Vec<TaskSnapshot> {
        let tasks: Vec<Task> = {
            let tasks = self.tasks.lock();
            tasks
                .iter()
                .filter(|t| t.is_live())
                .skip(offset)
                .take(limit)
                .cloned()
                .collect()
        };
        tasks.iter().filter_map(|t| self.describe_task(t)).collect()
    }

    pub fn collection_meta(&self, offset: usize, limit: usize) -> PagingMeta {
        PagingMeta::new(offset, limit, self.len())
    }

    /// Number of live tasks
    pub fn len(&self) -> usize {
        self.tasks.lock().iter().filter(|t| t.is_live()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live tasks in a terminal status, which an enqueue could evict
    pub fn removable_count(&self) -> usize {
        let tasks = self.tasks.lock();
        tasks
            .iter()
            .filter(|t| t.is_live() && t.is_removable())
            .count()
    }

    /// Flag a task for deletion; the driver cleans it up and unlinks it
    pub fn remove_task(&self, id: &Identifier) -> bool {
        let mut tasks = self.tasks.lock();
        match tasks.iter_mut().find(|t| &t.id == id && t.is_live()) {
            Some(task) => {
                task.delete_requested = true;
                log_task_operation("remove_requested", id, task.task_type, task.status, None);
                true
            }
            None => false,
        }
    }

    /// Identifiers of every linked task, including ones flagged for deletion
    pub(crate) fn task_ids(&self) -> Vec<Identifier> {
        self.tasks.lock().iter().map(|t| t.id).collect()
    }

    /// Decide what the driver does with a task, applying the state changes
    /// that must happen before any handler runs
    pub(crate) fn plan_visit(&self, id: &Identifier, now: DateTime<Utc>) -> Option<VisitPlan> {
        let mut tasks = self.tasks.lock();
        let task = tasks.iter_mut().find(|t| &t.id == id)?;

        if task.delete_requested {
            let clean = !task.resources_released;
            task.resources_released = true;
            return Some(VisitPlan::Remove {
                task: task.clone(),
                clean,
            });
        }

        if status_groups::TASK_ACTIVE_STATES.contains(&task.status) && task.is_expired(now) {
            let clean = !task.resources_released;
            task.resources_released = true;
            if clean {
                return Some(VisitPlan::Expire(task.clone()));
            }
            apply_transition(task, TaskStatus::Stopped, now);
            return None;
        }

        match task.status {
            TaskStatus::Pending => {
                apply_transition(task, TaskStatus::Active, now);
                task.awaiting_activity = true;
                Some(VisitPlan::Process(task.clone()))
            }
            TaskStatus::Active if !task.awaiting_activity => {
                Some(VisitPlan::Evaluate(task.clone()))
            }
            _ => None,
        }
    }

    /// Drop a task from the collection
    pub(crate) fn unlink(&self, id: &Identifier) -> Option<Task> {
        let mut tasks = self.tasks.lock();
        let position = tasks.iter().position(|t| &t.id == id)?;
        let task = tasks.remove(position);
        log_task_operation("deleted", id, task.task_type, task.status, None);
        Some(task)
    }

    /// Stop a task whose deadline passed, after its clean-up ran
    pub(crate) fn finish_expiry(&self, id: &Identifier, now: DateTime<Utc>) {
        self.with_task(id, |task| {
            task.awaiting_activity = false;
            if !task.status.is_terminal() {
                warn!(task_id = %task.id, "⏰ TASK_QUEUE: Task timed out");
                apply_transition(task, TaskStatus::Stopped, now);
            }
        });
    }

    /// Apply a begin-processing outcome to a task the driver made active
    pub(crate) fn apply_process_outcome(
        &self,
        id: &Identifier,
        outcome: HandlerOutcome,
        now: DateTime<Utc>,
    ) {
        self.with_task(id, |task| {
            if task.status != TaskStatus::Active {
                // an activity already settled the task
                return;
            }
            match outcome {
                HandlerOutcome::Failure => {
                    task.awaiting_activity = false;
                    apply_transition(task, TaskStatus::Failed, now);
                }
                HandlerOutcome::Retry => {
                    task.awaiting_activity = false;
                    apply_transition(task, TaskStatus::Pending, now);
                }
                HandlerOutcome::Pending => {}
                HandlerOutcome::Success | HandlerOutcome::NoChange => {
                    task.awaiting_activity = false;
                }
            }
        });
    }

    /// Apply an evaluate-progress outcome and record the evaluation time
    pub(crate) fn apply_evaluate_outcome(
        &self,
        id: &Identifier,
        outcome: HandlerOutcome,
        now: DateTime<Utc>,
    ) {
        self.with_task(id, |task| {
            task.last_evaluated_at = Some(now);
            if task.status != TaskStatus::Active {
                return;
            }
            match outcome {
                HandlerOutcome::Success => {
                    apply_transition(task, TaskStatus::Completed, now);
                }
                HandlerOutcome::Failure => {
                    apply_transition(task, TaskStatus::Failed, now);
                }
                HandlerOutcome::Pending | HandlerOutcome::NoChange | HandlerOutcome::Retry => {}
            }
        });
    }

    /// Activity reported that an active task may be evaluated again
    pub(crate) fn resume_task(&self, id: &Identifier) -> bool {
        self.with_task(id, |task| {
            if task.status != TaskStatus::Active || task.delete_requested {
                debug!(task_id = %task.id, status = %task.status, "Ignoring stale resume");
                return false;
            }
            task.awaiting_activity = false;
            true
        })
        .unwrap_or(false)
    }

    /// Activity reported that a task failed
    pub(crate) fn fail_task(&self, id: &Identifier, now: DateTime<Utc>) -> bool {
        self.with_task(id, |task| {
            if task.status.is_terminal() || task.delete_requested {
                debug!(task_id = %task.id, status = %task.status, "Ignoring stale failure");
                return false;
            }
            task.awaiting_activity = false;
            apply_transition(task, TaskStatus::Failed, now)
        })
        .unwrap_or(false)
    }

    /// Run an activity's final step while the task still waits on it.
    ///
    /// The step runs inside the queue's region, so a timeout or removal
    /// cannot land between the liveness check and the step. `None` means the
    /// task moved on and the step was skipped; otherwise the step's result
    /// resumes (`true`) or fails (`false`) the task.
    pub(crate) fn settle_activity(
        &self,
        id: &Identifier,
        now: DateTime<Utc>,
        step: impl FnOnce() -> bool,
    ) -> Option<bool> {
        let mut tasks = self.tasks.lock();
        let task = tasks.iter_mut().find(|t| &t.id == id)?;
        if task.status != TaskStatus::Active
            || !task.awaiting_activity
            || task.delete_requested
            || task.resources_released
        {
            debug!(task_id = %task.id, status = %task.status, "Skipping stale activity step");
            return None;
        }

        let succeeded = step();
        task.awaiting_activity = false;
        if !succeeded {
            apply_transition(task, TaskStatus::Failed, now);
        }
        Some(succeeded)
    }

    fn with_task<R>(&self, id: &Identifier, f: impl FnOnce(&mut Task) -> R) -> Option<R> {
        let mut tasks = self.tasks.lock();
        tasks.iter_mut().find(|t| &t.id == id).map(f)
    }
}

fn apply_transition(task: &mut Task, next: TaskStatus, now: DateTime<Utc>) -> bool {
    let previous = task.status;
    if task.transition_to(next, now) {
        log_task_operation(
            "transition",
            &task.id,
            task.task_type,
            next,
            Some(previous.as_str()),
        );
        true
    } else {
        warn!(
            task_id = %task.id,
            from = %previous,
            to = %next,
            "Rejected invalid task transition"
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use serde_json::json;

    fn queue(max_tasks: usize) -> TaskQueue {
        TaskQueue::new(max_tasks, Arc::new(TaskHandlerRegistry::new()))
    }

    fn finish(queue: &TaskQueue, id: &Identifier, status: TaskStatus) {
        let now = Utc::now();
        queue.plan_visit(id, now);
        queue.with_task(id, |task| {
            task.awaiting_activity = false;
            apply_transition(task, status, now);
        });
    }

    #[test]
    fn test_queue_and_find() {
        let queue = queue(4);
        let id = queue
            .queue_task(TaskType::AddThreadDevice, json!({"timeout": 60}))
            .unwrap();
        let task = queue.find_task(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(queue.len(), 1);
        assert!(queue.find_task(&Identifier::generate()).is_none());
    }

    #[test]
    fn test_capacity_without_finished_tasks_fails() {
        let queue = queue(2);
        queue.queue_task(TaskType::AddThreadDevice, json!({})).unwrap();
        queue.queue_task(TaskType::AddThreadDevice, json!({})).unwrap();
        let result = queue.queue_task(TaskType::AddThreadDevice, json!({}));
        assert!(matches!(result, Err(TaskerError::CapacityError(_))));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest_finished_task() {
        let queue = queue(3);
        let a = queue.queue_task(TaskType::AddThreadDevice, json!({})).unwrap();
        let b = queue.queue_task(TaskType::AddThreadDevice, json!({})).unwrap();
        let c = queue.queue_task(TaskType::AddThreadDevice, json!({})).unwrap();
        // b finishes first but a is older
        finish(&queue, &b, TaskStatus::Completed);
        finish(&queue, &a, TaskStatus::Failed);
        queue.with_task(&a, |t| t.created_at = t.created_at - TimeDelta::seconds(5));
        assert_eq!(queue.removable_count(), 2);

        let enqueued = queue
            .enqueue(TaskType::AddThreadDevice, json!({}))
            .unwrap();
        assert_eq!(enqueued.evicted, Some(a));
        assert!(queue.find_task(&a).is_none());
        assert!(queue.find_task(&b).is_some());
        assert!(queue.find_task(&c).is_some());
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_remove_task_hides_it() {
        let queue = queue(2);
        let id = queue.queue_task(TaskType::AddThreadDevice, json!({})).unwrap();
        assert!(queue.remove_task(&id));
        assert!(!queue.remove_task(&id));
        assert!(queue.find_task(&id).is_none());
        // still linked until the driver unlinks it
        assert_eq!(queue.task_ids(), vec![id]);
        assert!(queue.unlink(&id).is_some());
        assert!(queue.task_ids().is_empty());
    }

    #[test]
    fn test_plan_visit_sequence() {
        let queue = queue(2);
        let id = queue.queue_task(TaskType::AddThreadDevice, json!({})).unwrap();
        let now = Utc::now();

        assert!(matches!(queue.plan_visit(&id, now), Some(VisitPlan::Process(_))));
        assert_eq!(queue.status(&id), Some(TaskStatus::Active));
        // awaiting begin-processing result
        assert!(queue.plan_visit(&id, now).is_none());

        queue.apply_process_outcome(&id, HandlerOutcome::Success, now);
        assert!(matches!(queue.plan_visit(&id, now), Some(VisitPlan::Evaluate(_))));

        queue.apply_evaluate_outcome(&id, HandlerOutcome::Success, now);
        let task = queue.find_task(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.last_evaluated_at, Some(now));
        assert!(queue.plan_visit(&id, now).is_none());
    }

    #[test]
    fn test_retry_returns_to_pending() {
        let queue = queue(2);
        let id = queue.queue_task(TaskType::AddThreadDevice, json!({})).unwrap();
        let now = Utc::now();
        queue.plan_visit(&id, now);
        queue.apply_process_outcome(&id, HandlerOutcome::Retry, now);
        assert_eq!(queue.status(&id), Some(TaskStatus::Pending));
        assert!(matches!(queue.plan_visit(&id, now), Some(VisitPlan::Process(_))));
    }

    #[test]
    fn test_expiry_plans_clean_once() {
        let queue = queue(2);
        let id = queue
            .queue_task(TaskType::AddThreadDevice, json!({"timeout": 1}))
            .unwrap();
        let later = Utc::now() + TimeDelta::seconds(5);

        assert!(matches!(queue.plan_visit(&id, later), Some(VisitPlan::Expire(_))));
        queue.finish_expiry(&id, later);
        assert_eq!(queue.status(&id), Some(TaskStatus::Stopped));
        assert!(queue.plan_visit(&id, later).is_none());

        queue.remove_task(&id);
        match queue.plan_visit(&id, later) {
            Some(VisitPlan::Remove { clean, .. }) => assert!(!clean),
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn test_progress_updates_ignore_terminal_tasks() {
        let queue = queue(2);
        let id = queue.queue_task(TaskType::AddThreadDevice, json!({})).unwrap();
        let now = Utc::now();
        queue.plan_visit(&id, now);
        queue.apply_process_outcome(&id, HandlerOutcome::Pending, now);
        assert!(queue.plan_visit(&id, now).is_none());

        assert!(queue.resume_task(&id));
        assert!(matches!(queue.plan_visit(&id, now), Some(VisitPlan::Evaluate(_))));
        assert!(queue.fail_task(&id, now));
        assert!(!queue.fail_task(&id, now));
        assert!(!queue.resume_task(&id));
        assert_eq!(queue.status(&id), Some(TaskStatus::Failed));
    }

    #[test]
    fn test_settle_runs_step_only_while_awaited() {
        let queue = queue(2);
        let id = queue
            .queue_task(TaskType::AddThreadDevice, json!({"timeout": 60}))
            .unwrap();
        let now = Utc::now();
        queue.plan_visit(&id, now);
        queue.apply_process_outcome(&id, HandlerOutcome::Pending, now);

        let later = now + TimeDelta::seconds(120);
        assert!(matches!(queue.plan_visit(&id, later), Some(VisitPlan::Expire(_))));

        let mut ran = false;
        assert_eq!(queue.settle_activity(&id, later, || { ran = true; true }), None);
        assert!(!ran);
    }

    #[test]
    fn test_settle_failure_fails_task() {
        let queue = queue(2);
        let id = queue.queue_task(TaskType::AddThreadDevice, json!({})).unwrap();
        let now = Utc::now();
        queue.plan_visit(&id, now);
        queue.apply_process_outcome(&id, HandlerOutcome::Pending, now);

        assert_eq!(queue.settle_activity(&id, now, || false), Some(false));
        assert_eq!(queue.status(&id), Some(TaskStatus::Failed));
        assert_eq!(queue.settle_activity(&id, now, || true), None);
    }

    #[test]
    fn test_collection_meta_counts_live_tasks() {
        let queue = queue(4);
        let id = queue.queue_task(TaskType::AddThreadDevice, json!({})).unwrap();
        queue.queue_task(TaskType::AddThreadDevice, json!({})).unwrap();
        queue.remove_task(&id);
        let meta = queue.collection_meta(0, 10);
        assert_eq!(meta.collection.total, 1);
    }
}
