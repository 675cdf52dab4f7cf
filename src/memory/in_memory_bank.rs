use super::memory_bank::{newest_first, MemoryBank};
use super::memory_record::{MemoryRecord, NewReport};
use crate::common::{Clock, GeoPoint, SystemClock};
use crate::error::MemoryError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local memory bank. Nothing survives a restart.
pub struct InMemoryBank {
    records: RwLock<Vec<MemoryRecord>>,
    clock: Arc<dyn Clock>,
    proximity_radius_m: f64,
}

impl InMemoryBank {
    pub fn new(proximity_radius_m: f64) -> Self {
        Self::with_clock(proximity_radius_m, Arc::new(SystemClock))
    }

    pub fn with_clock(proximity_radius_m: f64, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            clock,
            proximity_radius_m,
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl MemoryBank for InMemoryBank {
    async fn was_recently_reported(
        &self,
        location: GeoPoint,
        window: chrono::Duration,
    ) -> Result<bool, MemoryError> {
        let now = self.clock.now();
        let records = self.records.read().await;
        let hit = records.iter().any(|record| {
            record.is_near(&location, self.proximity_radius_m) && record.is_recent(now, window)
        });
        debug!("Recent report lookup for {} -> {}", location, hit);
        Ok(hit)
    }

    async fn save_report(&self, report: NewReport) -> Result<MemoryRecord, MemoryError> {
        let record = MemoryRecord::new(report, self.clock.now());
        self.records.write().await.push(record.clone());
        debug!("Saved report {} at {}", record.id, record.location);
        Ok(record)
    }

    async fn location_history(
        &self,
        location: GeoPoint,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let mut nearby: Vec<MemoryRecord> = self
            .records
            .read()
            .await
            .iter()
            .filter(|record| record.is_near(&location, self.proximity_radius_m))
            .cloned()
            .collect();
        newest_first(&mut nearby);
        nearby.truncate(limit);
        Ok(nearby)
    }

    async fn all_reports(&self, limit: usize) -> Result<Vec<MemoryRecord>, MemoryError> {
        let mut all = self.records.read().await.clone();
        newest_first(&mut all);
        all.truncate(limit);
        Ok(all)
    }

    fn proximity_radius_m(&self) -> f64 {
        self.proximity_radius_m
    }
}
