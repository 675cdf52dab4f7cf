//! Scripted collaborators for unit tests

use crate::common::{GeoPoint, ImageReference};
use crate::error::{DetectionError, EmissionError, GenerationError, MemoryError, WorkflowError};
use crate::memory::{InMemoryBank, MemoryBank, MemoryRecord, NewReport};
use crate::pipeline::services::classification::TextGenerator;
use crate::pipeline::services::detection::HazardDetector;
use crate::pipeline::services::orchestration::{WorkflowNode, WorkflowState, WorkflowStep};
use crate::pipeline::services::reporting::{
    AuthorityReportEmitter, RenderRequest, Rendered, ReportEmitter,
};
use crate::pipeline::types::Detection;
use async_trait::async_trait;
use std::time::Duration;

pub struct ScriptedDetector {
    result: Result<Vec<Detection>, DetectionError>,
    delay: Option<Duration>,
}

impl ScriptedDetector {
    pub fn returning(detections: Vec<Detection>) -> Self {
        Self {
            result: Ok(detections),
            delay: None,
        }
    }

    pub fn failing(error: DetectionError) -> Self {
        Self {
            result: Err(error),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl HazardDetector for ScriptedDetector {
    async fn detect(&self, _image: &ImageReference) -> Result<Vec<Detection>, DetectionError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }

    fn name(&self) -> &'static str {
        "ScriptedDetector"
    }
}

pub struct ScriptedGenerator {
    answer: Option<String>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            delay: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer
            .clone()
            .ok_or_else(|| GenerationError::Failed("scripted failure".to_string()))
    }
}

/// A memory backend that is always down
pub struct UnavailableMemory;

#[async_trait]
impl MemoryBank for UnavailableMemory {
    async fn was_recently_reported(
        &self,
        _location: GeoPoint,
        _window: chrono::Duration,
    ) -> Result<bool, MemoryError> {
        Err(MemoryError::Unavailable("connection refused".to_string()))
    }

    async fn save_report(&self, _report: NewReport) -> Result<MemoryRecord, MemoryError> {
        Err(MemoryError::Unavailable("connection refused".to_string()))
    }

    async fn location_history(
        &self,
        _location: GeoPoint,
        _limit: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        Err(MemoryError::Unavailable("connection refused".to_string()))
    }

    async fn all_reports(&self, _limit: usize) -> Result<Vec<MemoryRecord>, MemoryError> {
        Err(MemoryError::Unavailable("connection refused".to_string()))
    }

    fn proximity_radius_m(&self) -> f64 {
        50.0
    }
}

/// A working in-memory bank whose dedup check and save stall for `delay`
pub struct SlowMemory {
    inner: InMemoryBank,
    delay: Duration,
}

impl SlowMemory {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryBank::new(50.0),
            delay,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }
}

#[async_trait]
impl MemoryBank for SlowMemory {
    async fn was_recently_reported(
        &self,
        location: GeoPoint,
        window: chrono::Duration,
    ) -> Result<bool, MemoryError> {
        tokio::time::sleep(self.delay).await;
        self.inner.was_recently_reported(location, window).await
    }

    async fn save_report(&self, report: NewReport) -> Result<MemoryRecord, MemoryError> {
        tokio::time::sleep(self.delay).await;
        self.inner.save_report(report).await
    }

    async fn location_history(
        &self,
        location: GeoPoint,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        self.inner.location_history(location, limit).await
    }

    async fn all_reports(&self, limit: usize) -> Result<Vec<MemoryRecord>, MemoryError> {
        self.inner.all_reports(limit).await
    }

    fn proximity_radius_m(&self) -> f64 {
        self.inner.proximity_radius_m()
    }
}

pub struct FailingEmitter;

#[async_trait]
impl ReportEmitter for FailingEmitter {
    async fn render(&self, _request: &RenderRequest) -> Result<Rendered, EmissionError> {
        Err(EmissionError::Render("template engine offline".to_string()))
    }
}

/// Renders like the default emitter, after `delay`
pub struct SlowEmitter {
    inner: AuthorityReportEmitter,
    delay: Duration,
}

impl SlowEmitter {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: AuthorityReportEmitter::new(),
            delay,
        }
    }
}

#[async_trait]
impl ReportEmitter for SlowEmitter {
    async fn render(&self, request: &RenderRequest) -> Result<Rendered, EmissionError> {
        tokio::time::sleep(self.delay).await;
        self.inner.render(request).await
    }
}

pub struct PanickingStep(pub WorkflowNode);

#[async_trait]
impl WorkflowStep for PanickingStep {
    async fn process(&self, _state: &mut WorkflowState) -> Result<(), WorkflowError> {
        panic!("step for {} blew up", self.0)
    }

    fn node(&self) -> WorkflowNode {
        self.0
    }

    fn name(&self) -> &'static str {
        "PanickingStep"
    }
}
