use super::routing::WorkflowNode;
use super::workflow_state::{RunOutcome, WorkflowState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Observer pattern for run metrics. Observers are shared between concurrent runs.
pub trait WorkflowObserver: Send + Sync {
    fn on_step_completed(&self, node: WorkflowNode, duration: Duration);
    fn on_run_finished(&self, state: &WorkflowState);
}

/// Fans notifications out to every registered observer
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn WorkflowObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(mut self, observer: Arc<dyn WorkflowObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn notify_step_completed(&self, node: WorkflowNode, duration: Duration) {
        for observer in &self.observers {
            observer.on_step_completed(node, duration);
        }
    }

    pub fn notify_run_finished(&self, state: &WorkflowState) {
        for observer in &self.observers {
            observer.on_run_finished(state);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatisticsSnapshot {
    pub runs: usize,
    pub reported: usize,
    pub suppressed: usize,
    pub not_reportable: usize,
    pub failed: usize,
    pub steps: usize,
}

/// Counts runs by outcome
#[derive(Debug, Default)]
pub struct RunStatistics {
    runs: AtomicUsize,
    reported: AtomicUsize,
    suppressed: AtomicUsize,
    not_reportable: AtomicUsize,
    failed: AtomicUsize,
    steps: AtomicUsize,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> RunStatisticsSnapshot {
        RunStatisticsSnapshot {
            runs: self.runs.load(Ordering::Relaxed),
            reported: self.reported.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            not_reportable: self.not_reportable.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            steps: self.steps.load(Ordering::Relaxed),
        }
    }
}

impl WorkflowObserver for RunStatistics {
    fn on_step_completed(&self, _node: WorkflowNode, _duration: Duration) {
        self.steps.fetch_add(1, Ordering::Relaxed);
    }

    fn on_run_finished(&self, state: &WorkflowState) {
        self.runs.fetch_add(1, Ordering::Relaxed);
        // a report that failed to render still counts as reported
        let counter = match state.outcome() {
            RunOutcome::Reported | RunOutcome::ReportedWithError(_) => &self.reported,
            RunOutcome::Suppressed => &self.suppressed,
            RunOutcome::NotReportable => &self.not_reportable,
            RunOutcome::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        debug!("RunStatistics: {:?}", self.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{GeoPoint, ImageReference};
    use crate::error::WorkflowError;
    use crate::pipeline::services::orchestration::workflow_state::{Decision, DecisionReason};
    use crate::pipeline::types::Severity;
    use chrono::Utc;

    fn finished(decision: Option<Decision>, error: Option<WorkflowError>) -> WorkflowState {
        let mut state = WorkflowState::new(
            ImageReference::from_path("road.jpg"),
            GeoPoint::new(6.9271, 79.8612),
            Utc::now(),
        );
        if let Some(decision) = decision {
            state.record_decision(decision).unwrap();
        }
        if let Some(error) = error {
            state.record_error(error);
        }
        state
    }

    #[test]
    fn test_counts_by_outcome() {
        let stats = Arc::new(RunStatistics::new());
        let observers = ObserverSet::new().add_observer(stats.clone());

        observers.notify_run_finished(&finished(
            Some(Decision::new(Severity::High, DecisionReason::NewHazard)),
            None,
        ));
        observers.notify_run_finished(&finished(
            Some(Decision::new(Severity::High, DecisionReason::RecentlyReported)),
            None,
        ));
        let rejected = WorkflowError::InputValidation("bad gps".into());
        observers.notify_run_finished(&finished(None, Some(rejected)));
        observers.notify_run_finished(&finished(None, None));
        observers.notify_step_completed(WorkflowNode::Vision, Duration::from_millis(3));

        assert_eq!(
            stats.snapshot(),
            RunStatisticsSnapshot {
                runs: 4,
                reported: 1,
                suppressed: 1,
                not_reportable: 1,
                failed: 1,
                steps: 1,
            }
        );
    }
}
