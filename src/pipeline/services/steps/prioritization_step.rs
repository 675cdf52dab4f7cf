use crate::error::{MemoryError, WorkflowError};
use crate::memory::MemoryBank;
use crate::pipeline::services::classification::SeverityClassifier;
use crate::pipeline::services::orchestration::{
    Decision, DecisionReason, WorkflowNode, WorkflowState, WorkflowStep,
};
use crate::pipeline::types::Severity;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Decides severity and whether this hazard is new enough to report.
/// `should_report = severity reportable && !recently reported`.
pub struct PrioritizationStep {
    classifier: SeverityClassifier,
    memory: Arc<dyn MemoryBank>,
    dedup_window: chrono::Duration,
    memory_timeout: Duration,
}

impl PrioritizationStep {
    pub fn new(
        classifier: SeverityClassifier,
        memory: Arc<dyn MemoryBank>,
        dedup_window: chrono::Duration,
        memory_timeout: Duration,
    ) -> Self {
        Self {
            classifier,
            memory,
            dedup_window,
            memory_timeout,
        }
    }

    async fn recently_reported(&self, state: &WorkflowState) -> Result<bool, MemoryError> {
        let check = self
            .memory
            .was_recently_reported(state.location(), self.dedup_window);
        match tokio::time::timeout(self.memory_timeout, check).await {
            Ok(result) => result,
            Err(_) => Err(MemoryError::Timeout(self.memory_timeout)),
        }
    }
}

#[async_trait]
impl WorkflowStep for PrioritizationStep {
    async fn process(&self, state: &mut WorkflowState) -> Result<(), WorkflowError> {
        if state.detections().is_empty() {
            state.record_decision(Decision::new(Severity::Unset, DecisionReason::NoDetections))?;
            state.log("Prioritization -> Nothing detected, no report");
            return Ok(());
        }

        let severity = self
            .classifier
            .classify_with_advisory(state.detections(), state.image_dimensions())
            .await;

        if !severity.is_reportable() {
            state.record_decision(Decision::new(severity, DecisionReason::BelowThreshold))?;
            state.log(format!("Prioritization -> {} severity, no report", severity));
            return Ok(());
        }

        match self.recently_reported(state).await {
            Ok(true) => {
                info!(
                    "Hazard at {} already reported in the last {} days",
                    state.location(),
                    self.dedup_window.num_days()
                );
                state.record_decision(Decision::new(severity, DecisionReason::RecentlyReported))?;
                state.log(format!(
                    "Prioritization -> {} hazard already reported nearby, suppressed",
                    severity
                ));
                Ok(())
            }
            Ok(false) => {
                debug!("No recent report near {}", state.location());
                state.record_decision(Decision::new(severity, DecisionReason::NewHazard))?;
                state.log(format!("Prioritization -> New {} hazard, reporting", severity));
                Ok(())
            }
            Err(e) => {
                state.record_decision(Decision::new(severity, DecisionReason::MemoryUnavailable))?;
                state.log(format!("Prioritization -> {} hazard, memory check failed", severity));
                Err(WorkflowError::MemoryUnavailable(e))
            }
        }
    }

    fn node(&self) -> WorkflowNode {
        WorkflowNode::Prioritize
    }

    fn name(&self) -> &'static str {
        "PrioritizationStep"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{GeoPoint, ImageReference, ManualClock};
    use crate::config::ClassifierConfig;
    use crate::memory::{conformance::start_time, InMemoryBank, MemoryBank, NewReport};
    use crate::pipeline::test_support::{SlowMemory, UnavailableMemory};
    use crate::pipeline::types::{BoundingBox, Detection, ObjectClass};
    use chrono::Utc;

    const COLOMBO: GeoPoint = GeoPoint {
        latitude: 6.9271,
        longitude: 79.8612,
    };

    fn step(memory: Arc<dyn MemoryBank>) -> PrioritizationStep {
        PrioritizationStep::new(
            SeverityClassifier::new(ClassifierConfig::default()),
            memory,
            chrono::Duration::days(7),
            Duration::from_millis(100),
        )
    }

    fn state_with(detections: Vec<Detection>) -> WorkflowState {
        let mut state =
            WorkflowState::new(ImageReference::from_path("road.jpg"), COLOMBO, Utc::now());
        state.set_image_dimensions((640, 480));
        state.append_detections(detections);
        state
    }

    fn big_pothole() -> Detection {
        Detection::new(ObjectClass::Pothole, 0.95, BoundingBox::new(0, 0, 300, 300))
    }

    #[tokio::test]
    async fn test_new_hazard_is_reported() {
        let memory = Arc::new(InMemoryBank::new(50.0));
        let mut state = state_with(vec![big_pothole()]);
        step(memory).process(&mut state).await.unwrap();
        assert_eq!(state.severity(), Severity::High);
        assert!(state.should_report());
    }

    #[tokio::test]
    async fn test_recent_report_suppresses() {
        let clock = Arc::new(ManualClock::new(start_time()));
        let memory = Arc::new(InMemoryBank::with_clock(50.0, clock));
        memory
            .save_report(NewReport::new(COLOMBO, "Hazards: pothole", "old.jpg"))
            .await
            .unwrap();

        let mut state = state_with(vec![big_pothole()]);
        step(memory).process(&mut state).await.unwrap();
        assert_eq!(state.severity(), Severity::High);
        assert!(!state.should_report());
    }

    #[tokio::test]
    async fn test_low_severity_never_queries_memory() {
        // memory is down; a low-severity decision must not notice
        let weak = Detection::new(ObjectClass::Crack, 0.2, BoundingBox::new(0, 0, 5, 5));
        let mut state = state_with(vec![weak]);
        step(Arc::new(UnavailableMemory)).process(&mut state).await.unwrap();
        assert_eq!(state.severity(), Severity::Low);
        assert!(!state.should_report());
        assert!(state.error().is_none());
    }

    #[tokio::test]
    async fn test_memory_outage_is_an_error() {
        let mut state = state_with(vec![big_pothole()]);
        let result = step(Arc::new(UnavailableMemory)).process(&mut state).await;
        assert!(matches!(result, Err(WorkflowError::MemoryUnavailable(_))));
        assert!(!state.should_report());
        assert_eq!(state.severity(), Severity::High);
    }

    #[tokio::test]
    async fn test_slow_memory_check_times_out() {
        let memory = Arc::new(SlowMemory::new(Duration::from_millis(500)));
        let mut state = state_with(vec![big_pothole()]);
        let result = step(memory).process(&mut state).await;

        assert!(matches!(
            result,
            Err(WorkflowError::MemoryUnavailable(MemoryError::Timeout(_)))
        ));
        assert!(!state.should_report());
        assert_eq!(state.severity(), Severity::High);
    }

    #[tokio::test]
    async fn test_no_detections_leaves_severity_unset() {
        let mut state = state_with(vec![]);
        step(Arc::new(UnavailableMemory)).process(&mut state).await.unwrap();
        assert_eq!(state.severity(), Severity::Unset);
        assert!(!state.should_report());
    }
}
