use super::workflow_state::WorkflowState;
use serde::Serialize;
use std::fmt;

/// States of the workflow machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WorkflowNode {
    Supervise,
    Vision,
    Prioritize,
    Report,
    Done,
}

impl WorkflowNode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowNode::Supervise => "Supervise",
            WorkflowNode::Vision => "Vision",
            WorkflowNode::Prioritize => "Prioritize",
            WorkflowNode::Report => "Report",
            WorkflowNode::Done => "Done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == WorkflowNode::Done
    }
}

impl fmt::Display for WorkflowNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// The routing functions read only `error` and `should_report`.

pub fn route_after_supervise(state: &WorkflowState) -> WorkflowNode {
    match state.error() {
        Some(_) => WorkflowNode::Done,
        None => WorkflowNode::Vision,
    }
}

pub fn route_after_vision(state: &WorkflowState) -> WorkflowNode {
    match state.error() {
        Some(_) => WorkflowNode::Done,
        None => WorkflowNode::Prioritize,
    }
}

pub fn route_after_prioritize(state: &WorkflowState) -> WorkflowNode {
    match (state.error(), state.should_report()) {
        (Some(_), _) => WorkflowNode::Done,
        (None, true) => WorkflowNode::Report,
        (None, false) => WorkflowNode::Done,
    }
}

/// Report always ends the run, whatever it recorded
pub fn route_after_report(_state: &WorkflowState) -> WorkflowNode {
    WorkflowNode::Done
}

/// Total transition function over every node
pub fn next_node(current: WorkflowNode, state: &WorkflowState) -> WorkflowNode {
    match current {
        WorkflowNode::Supervise => route_after_supervise(state),
        WorkflowNode::Vision => route_after_vision(state),
        WorkflowNode::Prioritize => route_after_prioritize(state),
        WorkflowNode::Report => route_after_report(state),
        WorkflowNode::Done => WorkflowNode::Done,
    }
}
