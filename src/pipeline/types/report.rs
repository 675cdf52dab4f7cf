use super::Severity;
use crate::common::GeoPoint;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Structured report payload, ready to forward to a road authority
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorityReport {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub gps: String,
    pub location: GeoPoint,
    pub location_link: String,
    pub findings: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_base64: Option<String>,
    pub source: String,
    pub api_ready: bool,
}

/// Everything the Report step produced for the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub voice_text: String,
    pub payload: AuthorityReport,
    /// Human readable report with the workflow log
    pub text: String,
}
