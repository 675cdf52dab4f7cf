pub mod observer;
pub mod routing;
pub mod step_timings;
pub mod workflow_engine;
pub mod workflow_state;
pub mod workflow_step;

pub use observer::{ObserverSet, RunStatistics, RunStatisticsSnapshot, WorkflowObserver};
pub use routing::{
    next_node, route_after_prioritize, route_after_report, route_after_supervise,
    route_after_vision, WorkflowNode,
};
pub use step_timings::StepTimings;
pub use workflow_engine::{WorkflowEngine, WorkflowEngineBuilder};
pub use workflow_state::{Decision, DecisionReason, RunOutcome, WorkflowState};
pub use workflow_step::WorkflowStep;
