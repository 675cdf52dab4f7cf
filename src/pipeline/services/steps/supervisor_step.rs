use crate::error::WorkflowError;
use crate::pipeline::services::orchestration::{WorkflowNode, WorkflowState, WorkflowStep};
use async_trait::async_trait;
use tracing::debug;

/// Validates the run input: a sane GPS fix and a decodable image
pub struct SupervisorStep;

impl SupervisorStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SupervisorStep {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowStep for SupervisorStep {
    async fn process(&self, state: &mut WorkflowState) -> Result<(), WorkflowError> {
        state
            .location()
            .validate()
            .map_err(WorkflowError::InputValidation)?;

        let image = state.image_reference().clone();
        if image.is_empty() {
            return Err(WorkflowError::InputValidation("empty image reference".to_string()));
        }

        let dimensions = tokio::task::spawn_blocking(move || image.read_dimensions())
            .await
            .map_err(|e| WorkflowError::Internal(format!("image header task failed: {}", e)))?
            .map_err(WorkflowError::InputValidation)?;
        debug!("Image {} is {}x{}", state.image_reference(), dimensions.0, dimensions.1);

        state.set_image_dimensions(dimensions);
        state.log(format!(
            "Supervisor -> Accepted {} ({}x{}) at {}",
            state.image_reference(),
            dimensions.0,
            dimensions.1,
            state.location()
        ));
        Ok(())
    }

    fn node(&self) -> WorkflowNode {
        WorkflowNode::Supervise
    }

    fn name(&self) -> &'static str {
        "SupervisorStep"
    }
}
