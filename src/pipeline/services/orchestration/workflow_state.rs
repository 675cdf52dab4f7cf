use super::step_timings::StepTimings;
use crate::common::{GeoPoint, ImageReference};
use crate::error::{ErrorKind, WorkflowError};
use crate::memory::MemoryRecord;
use crate::pipeline::types::{Detection, Report, Severity};
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

/// Why Prioritization decided what it did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    NoDetections,
    BelowThreshold,
    RecentlyReported,
    MemoryUnavailable,
    NewHazard,
}

/// The Prioritization outcome. `should_report` is true only for a new hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub severity: Severity,
    pub reason: DecisionReason,
}

impl Decision {
    pub fn new(severity: Severity, reason: DecisionReason) -> Self {
        Self { severity, reason }
    }

    pub fn should_report(&self) -> bool {
        self.reason == DecisionReason::NewHazard
    }
}

/// How a finished run ended, from the caller's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Reported,
    ReportedWithError(ErrorKind),
    Suppressed,
    NotReportable,
    Failed(ErrorKind),
}

/// The single record threaded through every step of one run.
/// Created at run start and handed back to the caller at Done.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    run_id: Uuid,
    image_reference: ImageReference,
    location: GeoPoint,
    started_at: DateTime<Utc>,
    image_dimensions: Option<(u32, u32)>,
    detections: Vec<Detection>,
    decision: Option<Decision>,
    error: Option<WorkflowError>,
    report: Option<Report>,
    saved_record: Option<MemoryRecord>,
    messages: Vec<String>,
    timings: StepTimings,
}

impl WorkflowState {
    pub fn new(
        image_reference: ImageReference,
        location: GeoPoint,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            image_reference,
            location,
            started_at,
            image_dimensions: None,
            detections: Vec::new(),
            decision: None,
            error: None,
            report: None,
            saved_record: None,
            messages: Vec::new(),
            timings: StepTimings::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn image_reference(&self) -> &ImageReference {
        &self.image_reference
    }

    pub fn location(&self) -> GeoPoint {
        self.location
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn image_dimensions(&self) -> Option<(u32, u32)> {
        self.image_dimensions
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn severity(&self) -> Severity {
        self.decision.map(|d| d.severity).unwrap_or(Severity::Unset)
    }

    pub fn should_report(&self) -> bool {
        self.decision.map(|d| d.should_report()).unwrap_or(false)
    }

    pub fn decision(&self) -> Option<Decision> {
        self.decision
    }

    pub fn error(&self) -> Option<&WorkflowError> {
        self.error.as_ref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(WorkflowError::kind)
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    pub fn saved_record(&self) -> Option<&MemoryRecord> {
        self.saved_record.as_ref()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn timings(&self) -> &StepTimings {
        &self.timings
    }

    pub fn outcome(&self) -> RunOutcome {
        match (&self.error, self.should_report()) {
            (None, true) => RunOutcome::Reported,
            (Some(err), true) => RunOutcome::ReportedWithError(err.kind()),
            (Some(err), false) => RunOutcome::Failed(err.kind()),
            (None, false) => match self.decision.map(|d| d.reason) {
                Some(DecisionReason::RecentlyReported) => RunOutcome::Suppressed,
                _ => RunOutcome::NotReportable,
            },
        }
    }

    pub(crate) fn set_image_dimensions(&mut self, dimensions: (u32, u32)) {
        self.image_dimensions = Some(dimensions);
    }

    pub(crate) fn append_detections(&mut self, detections: impl IntoIterator<Item = Detection>) {
        self.detections.extend(detections);
    }

    /// Severity and `should_report` are recorded together, exactly once
    pub(crate) fn record_decision(&mut self, decision: Decision) -> Result<(), WorkflowError> {
        if let Some(existing) = self.decision {
            return Err(WorkflowError::Internal(format!(
                "decision already recorded as {:?}",
                existing
            )));
        }
        if decision.should_report() && !decision.severity.is_reportable() {
            return Err(WorkflowError::Internal(format!(
                "cannot report a {} severity hazard",
                decision.severity
            )));
        }
        self.decision = Some(decision);
        Ok(())
    }

    /// The first error wins; later ones only reach the log
    pub(crate) fn record_error(&mut self, error: WorkflowError) {
        match &self.error {
            None => {
                self.log(format!("Error -> {}", error));
                self.error = Some(error);
            }
            Some(first) => {
                warn!("Run {} already failed with '{}', also got '{}'", self.run_id, first, error);
                self.log(format!("Additional error -> {}", error));
            }
        }
    }

    pub(crate) fn set_report(&mut self, report: Report) {
        self.report = Some(report);
    }

    pub(crate) fn set_saved_record(&mut self, record: MemoryRecord) {
        self.saved_record = Some(record);
    }

    pub(crate) fn log(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub(crate) fn timings_mut(&mut self) -> &mut StepTimings {
        &mut self.timings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MemoryError;

    fn state() -> WorkflowState {
        WorkflowState::new(
            ImageReference::from_path("road.jpg"),
            GeoPoint::new(6.9271, 79.8612),
            Utc::now(),
        )
    }

    #[test]
    fn test_defaults() {
        let state = state();
        assert_eq!(state.severity(), Severity::Unset);
        assert!(!state.should_report());
        assert!(state.detections().is_empty());
        assert!(state.error().is_none());
        assert!(state.report().is_none());
        assert_eq!(state.outcome(), RunOutcome::NotReportable);
    }

    #[test]
    fn test_decision_recorded_once() {
        let mut state = state();
        state
            .record_decision(Decision::new(Severity::High, DecisionReason::NewHazard))
            .unwrap();
        assert!(state.should_report());

        let second =
            state.record_decision(Decision::new(Severity::Low, DecisionReason::BelowThreshold));
        assert!(matches!(second, Err(WorkflowError::Internal(_))));
        assert_eq!(state.severity(), Severity::High);
    }

    #[test]
    fn test_low_severity_cannot_be_reported() {
        let mut state = state();
        let result = state.record_decision(Decision::new(Severity::Low, DecisionReason::NewHazard));
        assert!(result.is_err());
        assert!(!state.should_report());
    }

    #[test]
    fn test_first_error_wins() {
        let mut state = state();
        state.record_error(WorkflowError::MemoryUnavailable(MemoryError::Unavailable(
            "down".into(),
        )));
        state.record_error(WorkflowError::Internal("later".into()));
        assert_eq!(state.error_kind(), Some(ErrorKind::MemoryUnavailable));
        assert_eq!(state.messages().len(), 2);
    }

    #[test]
    fn test_suppressed_outcome() {
        let mut state = state();
        state
            .record_decision(Decision::new(Severity::High, DecisionReason::RecentlyReported))
            .unwrap();
        assert_eq!(state.outcome(), RunOutcome::Suppressed);
    }
}
