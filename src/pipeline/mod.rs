pub mod pipeline_factory;
pub mod services;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use pipeline_factory::PipelineFactory;
pub use services::{WorkflowEngine, WorkflowState};
pub use types::{Detection, Report, Severity};
