pub mod detection_service;
pub mod detector;
pub mod sign_condition;

pub use detection_service::{DetectionClient, DetectionClientBuilder, DetectionService};
pub use detector::{CompositeDetector, HazardDetector, SidecarDetector};
pub use sign_condition::{annotate_signs, assess_sign_condition};
