use crate::common::{GeoPoint, ImageReference};
use crate::error::EmissionError;
use crate::pipeline::services::classification::TextGenerator;
use crate::pipeline::types::{AuthorityReport, Detection, ObjectClass, Severity};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

pub const REPORT_SOURCE: &str = "SafeRoad-Guardian AI Agent";

/// What the Report step hands to the emitter
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub severity: Severity,
    pub detections: Vec<Detection>,
    pub location: GeoPoint,
    pub image_reference: ImageReference,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub voice_text: String,
    pub payload: AuthorityReport,
}

#[async_trait]
pub trait ReportEmitter: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> Result<Rendered, EmissionError>;
}

/// Default emitter: template voice lines (or generated ones when a generator is
/// configured) and a road-authority payload with the photo inlined as base64.
pub struct AuthorityReportEmitter {
    voice_generator: Option<Arc<dyn TextGenerator>>,
    voice_timeout: Duration,
}

impl AuthorityReportEmitter {
    pub fn new() -> Self {
        Self {
            voice_generator: None,
            voice_timeout: Duration::from_secs(3),
        }
    }

    pub fn with_voice_generator(
        mut self,
        generator: Arc<dyn TextGenerator>,
        timeout: Duration,
    ) -> Self {
        self.voice_generator = Some(generator);
        self.voice_timeout = timeout;
        self
    }

    async fn voice_text(&self, severity: Severity, hazard: &str) -> String {
        if let Some(generator) = &self.voice_generator {
            let prompt = voice_prompt(severity, hazard);
            match tokio::time::timeout(self.voice_timeout, generator.generate(&prompt)).await {
                Ok(Ok(text)) => match clean_voice_line(&text) {
                    Some(line) => return line,
                    None => debug!("Empty generated voice line, using template"),
                },
                Ok(Err(e)) => warn!("Voice generation failed, using template: {}", e),
                Err(_) => warn!(
                    "Voice generation timed out after {:?}, using template",
                    self.voice_timeout
                ),
            }
        }
        template_voice_line(severity, hazard)
    }
}

impl Default for AuthorityReportEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportEmitter for AuthorityReportEmitter {
    async fn render(&self, request: &RenderRequest) -> Result<Rendered, EmissionError> {
        if !request.severity.is_reportable() {
            return Err(EmissionError::Render(format!(
                "{} severity is not reportable",
                request.severity
            )));
        }

        let hazard = hazard_description(&request.detections);
        let voice_text = self.voice_text(request.severity, &hazard).await;

        let photo_base64 = match request.image_reference.read_bytes().await {
            Ok(bytes) => Some(BASE64.encode(bytes)),
            Err(e) => {
                warn!("Report goes out without a photo: {}", e);
                None
            }
        };

        let payload = AuthorityReport {
            id: Uuid::new_v4(),
            timestamp: request.timestamp,
            gps: request.location.to_string(),
            location: request.location,
            location_link: request.location.maps_link(),
            findings: request.summary.clone(),
            severity: request.severity,
            photo_base64,
            source: REPORT_SOURCE.to_string(),
            api_ready: true,
        };

        Ok(Rendered { voice_text, payload })
    }
}

/// Short name of the most confident hazard, e.g. "Pothole"
pub fn hazard_description(detections: &[Detection]) -> String {
    let top = detections
        .iter()
        .filter(|d| d.is_hazard())
        .max_by(|a, b| a.confidence().total_cmp(&b.confidence()));
    match top.map(|d| d.class_label()) {
        Some(ObjectClass::Pothole) => "Pothole".to_string(),
        Some(ObjectClass::Crack) => "Road crack".to_string(),
        _ => "Road hazard".to_string(),
    }
}

pub fn template_voice_line(severity: Severity, hazard: &str) -> String {
    match severity {
        Severity::High => format!("Danger. {}. Use caution.", hazard),
        Severity::Medium => format!("Warning. {} detected ahead.", hazard),
        Severity::Low => format!("Caution. {}.", hazard),
        Severity::Unset => format!("Alert. {}.", hazard),
    }
}

fn voice_prompt(severity: Severity, hazard: &str) -> String {
    format!(
        "You are a road safety alert system. Write one short, calm voice alert \
         (at most 10 words) for a driver. Hazard: {}. Severity: {}. \
         No quotes, no explanations.",
        hazard, severity
    )
}

/// First non-empty line, without surrounding quotes or backticks
fn clean_voice_line(text: &str) -> Option<String> {
    text.lines()
        .map(|line| line.trim().trim_matches(|c| c == '"' || c == '\'' || c == '`').trim())
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Voice line for images that only show road signs. Signs are informational
/// and never reported; the most relevant sign decides the line.
pub fn sign_notice(detections: &[Detection]) -> Option<String> {
    let has = |class: ObjectClass| detections.iter().any(|d| d.class_label() == class);
    if !detections.iter().any(|d| d.class_label().is_sign()) {
        return None;
    }
    let line = if has(ObjectClass::HospitalSign) {
        "Hospital crossing ahead. Reduce speed and no horn zone"
    } else if has(ObjectClass::SchoolSign) {
        "School zone ahead. Reduce speed and watch for children"
    } else if has(ObjectClass::PedestrianCrossingSign) {
        "Pedestrian crossing ahead. Reduce speed and stay alert"
    } else if has(ObjectClass::StopSign) {
        "Stop sign ahead. Prepare to stop"
    } else if has(ObjectClass::YieldSign) {
        "Yield sign ahead. Prepare to give way"
    } else {
        "Road sign detected. Stay alert"
    };
    Some(line.to_string())
}

/// Plain-text email body for a road maintenance authority
pub fn authority_email(report: &AuthorityReport) -> String {
    let photo_line = if report.photo_base64.is_some() {
        "A photo of the hazard is attached to this report."
    } else {
        "No photo could be attached to this report."
    };
    format!(
        "Subject: URGENT: Road Hazard Detected - Action Required\n\
         \n\
         Dear Road Maintenance Authority,\n\
         \n\
         This is an automated report from the SafeRoad-Guardian monitoring system.\n\
         \n\
         HAZARD DETAILS:\n\
         --------------\n\
         Severity: {}\n\
         Location (GPS): {}\n\
         Google Maps Link: {}\n\
         Detection Details: {}\n\
         Timestamp: {}\n\
         Report ID: {}\n\
         \n\
         {}\n\
         \n\
         Best regards,\n\
         SafeRoad-Guardian\n\
         Automated Road Safety Monitoring",
        report.severity,
        report.gps,
        report.location_link,
        report.findings,
        report.timestamp.to_rfc3339(),
        report.id,
        photo_line
    )
}

/// Human readable report: header, findings and the workflow log
pub fn printable_report(
    payload: &AuthorityReport,
    image_reference: &ImageReference,
    messages: &[String],
) -> String {
    let heavy = "=".repeat(60);
    let light = "-".repeat(60);
    let mut lines = vec![
        heavy.clone(),
        "SAFEROAD-GUARDIAN HAZARD REPORT".to_string(),
        heavy.clone(),
        format!("Timestamp: {}", payload.timestamp.format("%Y-%m-%d %H:%M:%S UTC")),
        format!("Location (GPS): {}", payload.gps),
        format!("Image Source: {}", image_reference),
        format!("Severity: {}", payload.severity),
        light.clone(),
        "DETECTION RESULTS:".to_string(),
        payload.findings.clone(),
        light,
        "WORKFLOW LOG:".to_string(),
    ];
    lines.extend(messages.iter().map(|m| format!("  - {}", m)));
    lines.push(heavy);
    lines.join("\n")
}
