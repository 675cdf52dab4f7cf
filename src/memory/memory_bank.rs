use super::memory_record::{MemoryRecord, NewReport};
use crate::common::GeoPoint;
use crate::error::MemoryError;
use async_trait::async_trait;

/// Deduplication memory: an append-only log of reports, queried by proximity
/// and recency.
///
/// Check-then-save is not atomic. Two concurrent runs for the same spot can
/// both see "not reported" and both save; callers accept that double report
/// instead of serializing every run behind a global lock.
#[async_trait]
pub trait MemoryBank: Send + Sync {
    /// True if a record lies strictly within the proximity radius of `location`
    /// and is newer than `now - window`. Backend failures are errors, never `false`.
    async fn was_recently_reported(
        &self,
        location: GeoPoint,
        window: chrono::Duration,
    ) -> Result<bool, MemoryError>;

    /// Appends a record stamped with the bank's clock. Never overwrites.
    async fn save_report(&self, report: NewReport) -> Result<MemoryRecord, MemoryError>;

    /// Records near `location`, newest first
    async fn location_history(
        &self,
        location: GeoPoint,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError>;

    /// All records, newest first
    async fn all_reports(&self, limit: usize) -> Result<Vec<MemoryRecord>, MemoryError>;

    fn proximity_radius_m(&self) -> f64;
}

/// Newest-first ordering shared by the backends
pub(crate) fn newest_first(records: &mut [MemoryRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
