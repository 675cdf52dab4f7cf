use crate::common::ImageReference;
use crate::error::DetectionError;
use crate::pipeline::types::Detection;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// An object detection model, seen from the outside
#[async_trait]
pub trait HazardDetector: Send + Sync {
    async fn detect(&self, image: &ImageReference) -> Result<Vec<Detection>, DetectionError>;
    fn name(&self) -> &'static str;
}

/// Runs several detectors in order and concatenates their detections.
/// Any failing detector fails the whole call.
pub struct CompositeDetector {
    detectors: Vec<Arc<dyn HazardDetector>>,
}

impl CompositeDetector {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    pub fn add_detector(mut self, detector: Arc<dyn HazardDetector>) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

impl Default for CompositeDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HazardDetector for CompositeDetector {
    async fn detect(&self, image: &ImageReference) -> Result<Vec<Detection>, DetectionError> {
        let mut all = Vec::new();
        for detector in &self.detectors {
            let found = detector.detect(image).await?;
            debug!("Detector '{}' found {} objects", detector.name(), found.len());
            all.extend(found);
        }
        Ok(all)
    }

    fn name(&self) -> &'static str {
        "CompositeDetector"
    }
}

const SIDECAR_SUFFIX: &str = ".detections.json";

/// Reads detections an external model runner wrote next to the image,
/// as `<image file name>.detections.json`.
pub struct SidecarDetector;

impl SidecarDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn sidecar_path(&self, image: &ImageReference) -> Result<PathBuf, DetectionError> {
        let path = image.path().ok_or_else(|| {
            DetectionError::Unreadable("sidecar detections need an image file path".to_string())
        })?;
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(SIDECAR_SUFFIX);
        Ok(PathBuf::from(sidecar))
    }
}

impl Default for SidecarDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HazardDetector for SidecarDetector {
    async fn detect(&self, image: &ImageReference) -> Result<Vec<Detection>, DetectionError> {
        let sidecar = self.sidecar_path(image)?;
        let content = tokio::fs::read_to_string(&sidecar).await.map_err(|e| {
            DetectionError::Backend(format!("cannot read {}: {}", sidecar.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            DetectionError::Backend(format!("malformed detections in {}: {}", sidecar.display(), e))
        })
    }

    fn name(&self) -> &'static str {
        "SidecarDetector"
    }
}
