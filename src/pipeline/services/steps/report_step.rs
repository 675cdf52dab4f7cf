use crate::error::{EmissionError, MemoryError, WorkflowError};
use crate::memory::{MemoryBank, NewReport};
use crate::pipeline::services::orchestration::{WorkflowNode, WorkflowState, WorkflowStep};
use crate::pipeline::services::reporting::{printable_report, RenderRequest, ReportEmitter};
use crate::pipeline::types::{findings_summary, Report};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Persists the report to memory, then renders the voice line and authority payload.
///
/// The save happens first so a rendering failure never causes a re-report on
/// the next run. Either failure is recorded; the decision stands.
pub struct ReportStep {
    memory: Arc<dyn MemoryBank>,
    emitter: Arc<dyn ReportEmitter>,
    memory_timeout: Duration,
    emitter_timeout: Duration,
}

impl ReportStep {
    pub fn new(
        memory: Arc<dyn MemoryBank>,
        emitter: Arc<dyn ReportEmitter>,
        memory_timeout: Duration,
        emitter_timeout: Duration,
    ) -> Self {
        Self {
            memory,
            emitter,
            memory_timeout,
            emitter_timeout,
        }
    }
}

#[async_trait]
impl WorkflowStep for ReportStep {
    async fn process(&self, state: &mut WorkflowState) -> Result<(), WorkflowError> {
        let summary = findings_summary(state.detections());
        let new_report = NewReport::new(
            state.location(),
            summary.clone(),
            state.image_reference().to_string(),
        );

        let save = self.memory.save_report(new_report);
        let saved = match tokio::time::timeout(self.memory_timeout, save).await {
            Ok(result) => result,
            Err(_) => Err(MemoryError::Timeout(self.memory_timeout)),
        };
        let timestamp = match saved {
            Ok(record) => {
                info!("Saved report {} at {}", record.id, record.location);
                state.log(format!("Report -> Saved report {} to memory", record.id));
                let timestamp = record.timestamp;
                state.set_saved_record(record);
                timestamp
            }
            Err(e) => {
                error!("Could not save report for {}: {}", state.location(), e);
                state.record_error(WorkflowError::MemoryUnavailable(e));
                state.started_at()
            }
        };

        let request = RenderRequest {
            severity: state.severity(),
            detections: state.detections().to_vec(),
            location: state.location(),
            image_reference: state.image_reference().clone(),
            summary,
            timestamp,
        };
        let render = self.emitter.render(&request);
        let rendered = match tokio::time::timeout(self.emitter_timeout, render).await {
            Ok(result) => result?,
            Err(_) => return Err(EmissionError::Timeout(self.emitter_timeout).into()),
        };

        state.log(format!(
            "Report -> {} alert ready: \"{}\"",
            rendered.payload.severity, rendered.voice_text
        ));
        let text = printable_report(&rendered.payload, state.image_reference(), state.messages());
        state.set_report(Report {
            voice_text: rendered.voice_text,
            payload: rendered.payload,
            text,
        });
        Ok(())
    }

    fn node(&self) -> WorkflowNode {
        WorkflowNode::Report
    }

    fn name(&self) -> &'static str {
        "ReportStep"
    }
}
