pub mod advisory;
pub mod severity_classifier;

pub use advisory::{AdvisoryRefiner, TextGenerator};
pub use severity_classifier::{Assessment, SeverityClassifier};
