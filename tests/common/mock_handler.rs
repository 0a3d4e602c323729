//! Recording handler with scripted outcomes.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tasker_admission::registry::{TaskContext, TaskHandler, TaskHandlerRegistry, TaskType};
use tasker_admission::{HandlerOutcome, Identifier, Result, TaskerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerCall {
    Process(Identifier),
    Evaluate(Identifier),
    Clean(Identifier),
}

pub struct MockHandler {
    pub process_outcome: Mutex<HandlerOutcome>,
    pub evaluate_outcome: Mutex<HandlerOutcome>,
    /// Played in order before falling back to the fixed outcomes
    pub process_script: Mutex<VecDeque<HandlerOutcome>>,
    pub evaluate_script: Mutex<VecDeque<HandlerOutcome>>,
    pub calls: Mutex<Vec<HandlerCall>>,
}

impl MockHandler {
    pub fn new(process: HandlerOutcome, evaluate: HandlerOutcome) -> Arc<Self> {
        Arc::new(Self {
            process_outcome: Mutex::new(process),
            evaluate_outcome: Mutex::new(evaluate),
            process_script: Mutex::new(VecDeque::new()),
            evaluate_script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_evaluate(&self, outcome: HandlerOutcome) {
        *self.evaluate_outcome.lock() = outcome;
    }

    pub fn script_process(&self, outcomes: impl IntoIterator<Item = HandlerOutcome>) {
        self.process_script.lock().extend(outcomes);
    }

    pub fn script_evaluate(&self, outcomes: impl IntoIterator<Item = HandlerOutcome>) {
        self.evaluate_script.lock().extend(outcomes);
    }

    pub fn process_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, HandlerCall::Process(_)))
            .count()
    }

    pub fn calls(&self) -> Vec<HandlerCall> {
        self.calls.lock().clone()
    }

    pub fn cleans_of(&self, id: &Identifier) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| **call == HandlerCall::Clean(*id))
            .count()
    }

    pub fn registry(self: &Arc<Self>) -> Arc<TaskHandlerRegistry> {
        let mut registry = TaskHandlerRegistry::new();
        registry.register(self.clone());
        Arc::new(registry)
    }
}

#[async_trait]
impl TaskHandler for MockHandler {
    fn task_type(&self) -> TaskType {
        TaskType::AddThreadDevice
    }

    fn validate(&self, attributes: &Value) -> Result<()> {
        if attributes.get("reject").is_some() {
            return Err(TaskerError::ValidationError("rejected by mock".to_string()));
        }
        Ok(())
    }

    async fn process(&self, ctx: TaskContext) -> HandlerOutcome {
        self.calls.lock().push(HandlerCall::Process(ctx.task.id));
        let scripted = self.process_script.lock().pop_front();
        scripted.unwrap_or_else(|| *self.process_outcome.lock())
    }

    async fn evaluate(&self, ctx: TaskContext) -> HandlerOutcome {
        self.calls.lock().push(HandlerCall::Evaluate(ctx.task.id));
        let scripted = self.evaluate_script.lock().pop_front();
        scripted.unwrap_or_else(|| *self.evaluate_outcome.lock())
    }

    async fn clean(&self, ctx: TaskContext) -> HandlerOutcome {
        self.calls.lock().push(HandlerCall::Clean(ctx.task.id));
        HandlerOutcome::Success
    }
}
