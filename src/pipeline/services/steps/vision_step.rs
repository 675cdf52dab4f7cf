use crate::error::WorkflowError;
use crate::pipeline::services::detection::{annotate_signs, DetectionClient};
use crate::pipeline::services::orchestration::{WorkflowNode, WorkflowState, WorkflowStep};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Runs the detector stack and grades the condition of detected signs
pub struct VisionStep {
    detection: DetectionClient,
}

impl VisionStep {
    pub fn new(detection: DetectionClient) -> Self {
        Self { detection }
    }
}

#[async_trait]
impl WorkflowStep for VisionStep {
    async fn process(&self, state: &mut WorkflowState) -> Result<(), WorkflowError> {
        let image = state.image_reference().clone();
        let detections = self.detection.detect(image.clone()).await?;

        let detections = if detections.iter().any(|d| !d.is_hazard()) {
            let decoded = tokio::task::spawn_blocking(move || image.load())
                .await
                .map_err(|e| WorkflowError::Internal(format!("image decode task failed: {}", e)))?;
            match decoded {
                Ok(img) => annotate_signs(Some(&img), detections),
                Err(e) => {
                    warn!("Sign condition unknown, cannot decode image: {}", e);
                    annotate_signs(None, detections)
                }
            }
        } else {
            detections
        };

        let hazards = detections.iter().filter(|d| d.is_hazard()).count();
        let signs = detections.len() - hazards;
        debug!("Vision found {} hazards and {} signs", hazards, signs);

        state.append_detections(detections);
        state.log(format!(
            "Vision -> Detected {} hazard(s) and {} sign(s)",
            hazards, signs
        ));
        Ok(())
    }

    fn node(&self) -> WorkflowNode {
        WorkflowNode::Vision
    }

    fn name(&self) -> &'static str {
        "VisionStep"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{test_image_png, GeoPoint, ImageReference};
    use crate::error::{DetectionError, ErrorKind};
    use crate::pipeline::services::detection::DetectionClientBuilder;
    use crate::pipeline::test_support::ScriptedDetector;
    use crate::pipeline::types::{BoundingBox, Detection, ObjectClass, SignCondition};
    use chrono::Utc;
    use std::sync::Arc;
    use std::time::Duration;

    fn state() -> WorkflowState {
        WorkflowState::new(
            ImageReference::from_bytes(test_image_png(64, 64)),
            GeoPoint::new(6.9271, 79.8612),
            Utc::now(),
        )
    }

    fn step(detector: ScriptedDetector) -> VisionStep {
        VisionStep::new(
            DetectionClientBuilder::new(Arc::new(detector))
                .detect_timeout(Duration::from_millis(50))
                .build(),
        )
    }

    #[tokio::test]
    async fn test_signs_get_a_condition() {
        let detections = vec![
            Detection::new(ObjectClass::Pothole, 0.9, BoundingBox::new(0, 0, 20, 20)),
            Detection::new(ObjectClass::StopSign, 0.8, BoundingBox::new(30, 30, 10, 10)),
        ];
        let mut state = state();
        step(ScriptedDetector::returning(detections))
            .process(&mut state)
            .await
            .unwrap();

        assert_eq!(state.detections().len(), 2);
        assert_eq!(state.detections()[0].condition(), None);
        // mid-gray test image, luma 128
        assert_eq!(state.detections()[1].condition(), Some(SignCondition::Good));
    }

    #[tokio::test]
    async fn test_empty_detections_are_fine() {
        let mut state = state();
        step(ScriptedDetector::returning(vec![]))
            .process(&mut state)
            .await
            .unwrap();
        assert!(state.detections().is_empty());
        assert_eq!(state.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_detection_failure() {
        let mut state = state();
        let result = step(ScriptedDetector::returning(vec![]).with_delay(Duration::from_secs(1)))
            .process(&mut state)
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DetectionFailure);
        assert_eq!(
            err,
            WorkflowError::DetectionFailure(DetectionError::Timeout(Duration::from_millis(50)))
        );
    }
}
