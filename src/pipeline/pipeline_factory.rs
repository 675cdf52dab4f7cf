use crate::common::{Clock, SystemClock};
use crate::config::{Configuration, MemoryBackend};
use crate::error::AppError;
use crate::memory::{InMemoryBank, MemoryBank, SqliteMemoryBank};
use crate::pipeline::services::classification::{AdvisoryRefiner, SeverityClassifier, TextGenerator};
use crate::pipeline::services::detection::{DetectionClientBuilder, HazardDetector, SidecarDetector};
use crate::pipeline::services::orchestration::{
    WorkflowEngine, WorkflowEngineBuilder, WorkflowObserver,
};
use crate::pipeline::services::reporting::{AuthorityReportEmitter, ReportEmitter};
use crate::pipeline::services::steps::{
    PrioritizationStep, ReportStep, SupervisorStep, VisionStep,
};
use std::sync::Arc;
use tracing::info;

/// Wires a workflow engine from configuration. Collaborators not supplied
/// explicitly fall back to the defaults the configuration names.
pub struct PipelineFactory {
    config: Configuration,
    detector: Option<Arc<dyn HazardDetector>>,
    memory: Option<Arc<dyn MemoryBank>>,
    emitter: Option<Arc<dyn ReportEmitter>>,
    generator: Option<Arc<dyn TextGenerator>>,
    clock: Arc<dyn Clock>,
    observers: Vec<Arc<dyn WorkflowObserver>>,
}

impl PipelineFactory {
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            detector: None,
            memory: None,
            emitter: None,
            generator: None,
            clock: Arc::new(SystemClock),
            observers: Vec::new(),
        }
    }

    pub fn detector(mut self, detector: Arc<dyn HazardDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn memory(mut self, memory: Arc<dyn MemoryBank>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn emitter(mut self, emitter: Arc<dyn ReportEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Used for the severity advisory (when enabled) and for voice lines
    pub fn text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn WorkflowObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// The memory bank the engine will use, opening the configured backend if none was given
    pub fn open_memory(&self) -> Result<Arc<dyn MemoryBank>, AppError> {
        if let Some(memory) = &self.memory {
            return Ok(memory.clone());
        }
        let memory_config = &self.config.memory;
        let memory: Arc<dyn MemoryBank> = match memory_config.backend {
            MemoryBackend::Sqlite => Arc::new(
                SqliteMemoryBank::open(&memory_config.path, memory_config.proximity_radius_m)?
                    .with_clock(self.clock.clone()),
            ),
            MemoryBackend::Memory => Arc::new(InMemoryBank::with_clock(
                memory_config.proximity_radius_m,
                self.clock.clone(),
            )),
        };
        Ok(memory)
    }

    /// A builder holding every default step, open for further overrides
    pub fn builder(&self) -> Result<WorkflowEngineBuilder, AppError> {
        self.config.validate().map_err(AppError::InvalidConfig)?;

        let timeouts = &self.config.timeouts;
        let memory = self.open_memory()?;

        let detector = self
            .detector
            .clone()
            .unwrap_or_else(|| Arc::new(SidecarDetector::new()) as Arc<dyn HazardDetector>);
        let detection = DetectionClientBuilder::new(detector)
            .detect_timeout(timeouts.detector())
            .build();

        let mut classifier = SeverityClassifier::new(self.config.classifier.clone());
        let advisory = self.generator.as_ref().filter(|_| self.config.advisory.enabled);
        if let Some(generator) = advisory {
            classifier = classifier
                .with_advisory(AdvisoryRefiner::new(generator.clone(), timeouts.advisory()));
        }

        let emitter: Arc<dyn ReportEmitter> = match (&self.emitter, &self.generator) {
            (Some(emitter), _) => emitter.clone(),
            (None, Some(generator)) => Arc::new(
                AuthorityReportEmitter::new()
                    .with_voice_generator(generator.clone(), timeouts.advisory()),
            ),
            (None, None) => Arc::new(AuthorityReportEmitter::new()),
        };

        info!(
            "Workflow wired: {:?} memory, radius {}m, window {} days, advisory {}",
            self.config.memory.backend,
            self.config.memory.proximity_radius_m,
            self.config.memory.dedup_window_days,
            if advisory.is_some() { "on" } else { "off" }
        );

        let mut builder = WorkflowEngineBuilder::new()
            .clock(self.clock.clone())
            .step(Arc::new(SupervisorStep::new()))
            .step(Arc::new(VisionStep::new(detection)))
            .step(Arc::new(PrioritizationStep::new(
                classifier,
                memory.clone(),
                self.config.memory.dedup_window(),
                timeouts.memory(),
            )))
            .step(Arc::new(ReportStep::new(
                memory,
                emitter,
                timeouts.memory(),
                timeouts.emitter(),
            )));
        for observer in &self.observers {
            builder = builder.observer(observer.clone());
        }
        Ok(builder)
    }

    pub fn build(&self) -> Result<WorkflowEngine, AppError> {
        self.builder()?.build()
    }
}
