use super::routing::WorkflowNode;
use indexmap::IndexMap;
use std::time::Duration;

/// Duration of each executed step, in execution order
#[derive(Debug, Clone, Default)]
pub struct StepTimings {
    step_durations: IndexMap<WorkflowNode, Duration>,
}

impl StepTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a step's duration, accumulating if it somehow ran twice
    pub fn record(&mut self, node: WorkflowNode, duration: Duration) {
        *self.step_durations.entry(node).or_insert(Duration::ZERO) += duration;
    }

    pub fn get(&self, node: WorkflowNode) -> Option<Duration> {
        self.step_durations.get(&node).copied()
    }

    /// Steps in the order they ran
    pub fn executed(&self) -> impl Iterator<Item = WorkflowNode> + '_ {
        self.step_durations.keys().copied()
    }

    pub fn total(&self) -> Duration {
        self.step_durations.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WorkflowNode, &Duration)> {
        self.step_durations.iter()
    }
}
