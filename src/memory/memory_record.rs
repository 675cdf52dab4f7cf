use crate::common::GeoPoint;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted hazard report. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: Uuid,
    pub location: GeoPoint,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub image_reference: String,
}

impl MemoryRecord {
    /// Timestamps are kept at millisecond precision so every backend compares them alike
    pub fn new(report: NewReport, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            location: report.location,
            timestamp: timestamp.trunc_subsecs(3),
            summary: report.summary,
            image_reference: report.image_reference,
        }
    }

    /// Closed-open recency test: a record at exactly `now - window` has expired
    /// A window reaching past the earliest representable time covers everything.
    pub fn is_recent(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        match now.checked_sub_signed(window) {
            Some(cutoff) => self.timestamp > cutoff,
            None => true,
        }
    }

    pub fn is_near(&self, location: &GeoPoint, radius_m: f64) -> bool {
        self.location.is_within(location, radius_m)
    }
}

/// Input to `MemoryBank::save_report`
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub location: GeoPoint,
    pub summary: String,
    pub image_reference: String,
}

impl NewReport {
    pub fn new(
        location: GeoPoint,
        summary: impl Into<String>,
        image_reference: impl Into<String>,
    ) -> Self {
        Self {
            location,
            summary: summary.into(),
            image_reference: image_reference.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record_at(timestamp: DateTime<Utc>) -> MemoryRecord {
        MemoryRecord::new(
            NewReport::new(GeoPoint::new(6.9271, 79.8612), "Hazards: pothole", "a.jpg"),
            timestamp,
        )
    }

    #[test]
    fn test_window_boundary_is_expired() {
        let saved = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let record = record_at(saved);
        let window = chrono::Duration::days(7);

        assert!(record.is_recent(saved, window));
        assert!(record.is_recent(saved + window - chrono::Duration::milliseconds(1), window));
        assert!(!record.is_recent(saved + window, window));
        assert!(!record.is_recent(saved + window + chrono::Duration::seconds(1), window));
    }

    #[test]
    fn test_unbounded_window_keeps_record_recent() {
        let saved = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let record = record_at(saved);
        assert!(record.is_recent(saved, chrono::Duration::MAX));
        assert!(record.is_recent(saved, chrono::Duration::days(200_000_000)));
    }

    #[test]
    fn test_timestamp_truncated_to_millis() {
        let saved = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
            + chrono::Duration::nanoseconds(1_234_567);
        let record = record_at(saved);
        assert_eq!(record.timestamp.timestamp_subsec_nanos(), 1_000_000);
    }
}
