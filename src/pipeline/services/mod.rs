pub mod classification;
pub mod detection;
pub mod orchestration;
pub mod reporting;
pub mod steps;

pub use classification::{AdvisoryRefiner, SeverityClassifier, TextGenerator};
pub use detection::{CompositeDetector, HazardDetector, SidecarDetector};
pub use orchestration::{WorkflowEngine, WorkflowEngineBuilder, WorkflowState};
pub use reporting::{AuthorityReportEmitter, ReportEmitter};
