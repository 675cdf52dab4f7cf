mod detection;
mod report;
mod severity;

pub use detection::{findings_summary, BoundingBox, Detection, ObjectClass, SignCondition};
pub use report::{AuthorityReport, Report};
pub use severity::Severity;
