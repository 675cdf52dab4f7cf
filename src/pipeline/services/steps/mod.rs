pub mod prioritization_step;
pub mod report_step;
pub mod supervisor_step;
pub mod vision_step;

pub use prioritization_step::PrioritizationStep;
pub use report_step::ReportStep;
pub use supervisor_step::SupervisorStep;
pub use vision_step::VisionStep;
