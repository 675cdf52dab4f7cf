use super::observer::{ObserverSet, WorkflowObserver};
use super::routing::{next_node, WorkflowNode};
use super::workflow_state::WorkflowState;
use super::workflow_step::WorkflowStep;
use crate::common::{Clock, GeoPoint, ImageReference, SystemClock};
use crate::error::{AppError, WorkflowError};
use futures::FutureExt;
use indexmap::IndexMap;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

const STEP_NODES: [WorkflowNode; 4] = [
    WorkflowNode::Supervise,
    WorkflowNode::Vision,
    WorkflowNode::Prioritize,
    WorkflowNode::Report,
];

/// Drives one run through Supervise -> Vision -> Prioritize -> Report -> Done.
///
/// The engine is the only error boundary: a step's `Err` or panic lands in
/// `WorkflowState::error` and routing takes it from there. Every run returns a
/// terminal state. The engine holds no per-run data, so one instance can serve
/// concurrent runs.
pub struct WorkflowEngine {
    steps: IndexMap<WorkflowNode, Arc<dyn WorkflowStep>>,
    clock: Arc<dyn Clock>,
    observers: ObserverSet,
}

impl WorkflowEngine {
    pub async fn run(&self, image: ImageReference, location: GeoPoint) -> WorkflowState {
        self.run_with_cancellation(image, location, CancellationToken::new())
            .await
    }

    /// Cancellation is honored until Report starts; Report always completes.
    pub async fn run_with_cancellation(
        &self,
        image: ImageReference,
        location: GeoPoint,
        cancel: CancellationToken,
    ) -> WorkflowState {
        let mut state = WorkflowState::new(image, location, self.clock.now());
        info!("Run {} started for {} at {}", state.run_id(), state.image_reference(), location);

        let mut node = WorkflowNode::Supervise;
        while !node.is_terminal() {
            let Some(step) = self.steps.get(&node).cloned() else {
                state.record_error(WorkflowError::Internal(format!(
                    "no step registered for {}",
                    node
                )));
                break;
            };

            let step_start = Instant::now();
            let result = if node == WorkflowNode::Report {
                self.execute_step(step.as_ref(), &mut state).await
            } else if cancel.is_cancelled() {
                Err(WorkflowError::Cancelled)
            } else {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(WorkflowError::Cancelled),
                    result = self.execute_step(step.as_ref(), &mut state) => result,
                }
            };
            let duration = step_start.elapsed();

            state.timings_mut().record(node, duration);
            self.observers.notify_step_completed(node, duration);

            if let Err(e) = result {
                warn!("Step '{}' failed in run {}: {}", step.name(), state.run_id(), e);
                state.record_error(e);
            }

            let next = next_node(node, &state);
            debug!("Run {}: {} -> {}", state.run_id(), node, next);
            node = next;
        }

        info!(
            "Run {} finished as {:?} in {}us",
            state.run_id(),
            state.outcome(),
            state.timings().total().as_micros()
        );
        self.observers.notify_run_finished(&state);
        state
    }

    /// Synchronous entry point for callers outside a tokio runtime. Called from
    /// inside one, it returns a failed state without running any step.
    pub fn run_blocking(&self, image: ImageReference, location: GeoPoint) -> WorkflowState {
        if tokio::runtime::Handle::try_current().is_ok() {
            warn!("run_blocking called from inside a tokio runtime");
            return self.failed_run(
                image,
                location,
                "run_blocking called inside a runtime".to_string(),
            );
        }
        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt.block_on(self.run(image, location)),
            Err(e) => self.failed_run(image, location, format!("failed to create runtime: {}", e)),
        }
    }

    fn failed_run(
        &self,
        image: ImageReference,
        location: GeoPoint,
        message: String,
    ) -> WorkflowState {
        let mut state = WorkflowState::new(image, location, self.clock.now());
        state.record_error(WorkflowError::Internal(message));
        self.observers.notify_run_finished(&state);
        state
    }

    #[instrument(skip(self, step, state), fields(step = step.name(), run_id = %state.run_id()))]
    async fn execute_step(
        &self,
        step: &dyn WorkflowStep,
        state: &mut WorkflowState,
    ) -> Result<(), WorkflowError> {
        debug!("Executing step '{}'", step.name());
        match AssertUnwindSafe(step.process(state)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(WorkflowError::Internal(format!(
                "step '{}' panicked: {}",
                step.name(),
                panic_message(panic.as_ref())
            ))),
        }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.values().map(|step| step.name()).collect()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

pub struct WorkflowEngineBuilder {
    steps: IndexMap<WorkflowNode, Arc<dyn WorkflowStep>>,
    clock: Arc<dyn Clock>,
    observers: ObserverSet,
}

impl WorkflowEngineBuilder {
    pub fn new() -> Self {
        Self {
            steps: IndexMap::new(),
            clock: Arc::new(SystemClock),
            observers: ObserverSet::new(),
        }
    }

    /// Registers a step under the node it declares. A later step for the same node replaces it.
    pub fn step(mut self, step: Arc<dyn WorkflowStep>) -> Self {
        self.steps.insert(step.node(), step);
        self
    }

    // Sets the clock used for run timestamps, this will override the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn WorkflowObserver>) -> Self {
        self.observers = self.observers.add_observer(observer);
        self
    }

    pub fn build(self) -> Result<WorkflowEngine, AppError> {
        let missing: Vec<&str> = STEP_NODES
            .iter()
            .filter(|node| !self.steps.contains_key(*node))
            .map(|node| node.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Pipeline(format!(
                "workflow is missing steps for: {}",
                missing.join(", ")
            )));
        }
        if self.steps.contains_key(&WorkflowNode::Done) {
            return Err(AppError::Pipeline("Done is terminal and takes no step".to_string()));
        }

        Ok(WorkflowEngine {
            steps: self.steps,
            clock: self.clock,
            observers: self.observers,
        })
    }
}

impl Default for WorkflowEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
