use super::routing::WorkflowNode;
use super::workflow_state::WorkflowState;
use crate::error::WorkflowError;
use async_trait::async_trait;

/// One node of the workflow. A step mutates the state; routing happens afterwards,
/// in the engine, from what the step recorded.
///
/// Returning `Err` records the error on the state. Steps return only errors they
/// can classify; anything else surfaces as `WorkflowError::Internal`.
#[async_trait]
pub trait WorkflowStep: Send + Sync {
    async fn process(&self, state: &mut WorkflowState) -> Result<(), WorkflowError>;
    fn node(&self) -> WorkflowNode;
    fn name(&self) -> &'static str;
}
