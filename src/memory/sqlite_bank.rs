use super::memory_bank::MemoryBank;
use super::memory_record::{MemoryRecord, NewReport};
use crate::common::{Clock, GeoPoint, SystemClock};
use crate::error::{AppError, MemoryError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};
use uuid::Uuid;

/// Memory bank persisted in a SQLite file.
///
/// Queries prefilter on time and a latitude band in SQL, then apply the exact
/// haversine test in Rust.
pub struct SqliteMemoryBank {
    conn: Arc<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
    proximity_radius_m: f64,
}

impl SqliteMemoryBank {
    /// Open or create the store
    pub fn open(path: &Path, proximity_radius_m: f64) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 1000;
        "#,
        )?;

        let bank = Self::from_connection(conn, proximity_radius_m, Arc::new(SystemClock))?;
        info!("Memory bank opened at {:?}", path);
        Ok(bank)
    }

    /// Non-persistent store, mostly for tests
    pub fn open_in_memory(
        proximity_radius_m: f64,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        Self::from_connection(Connection::open_in_memory()?, proximity_radius_m, clock)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn from_connection(
        conn: Connection,
        proximity_radius_m: f64,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id TEXT PRIMARY KEY,
                recorded_at_ms INTEGER NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                summary TEXT NOT NULL,
                image_reference TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_reports_recorded_at ON reports(recorded_at_ms);
            CREATE INDEX IF NOT EXISTS idx_reports_latitude ON reports(latitude);
        "#,
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            clock,
            proximity_radius_m,
        })
    }

    /// Runs a closure against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T, MemoryError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, MemoryError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&conn)
        })
        .await
        .map_err(|e| MemoryError::Unavailable(format!("storage task failed: {}", e)))?
    }

    fn nearby_since(
        conn: &Connection,
        location: GeoPoint,
        radius_m: f64,
        since_ms: i64,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let (lat_min, lat_max) = location.latitude_band(radius_m);
        let mut stmt = conn.prepare_cached(
            r#"SELECT id, recorded_at_ms, latitude, longitude, summary, image_reference
               FROM reports
               WHERE recorded_at_ms > ?1 AND latitude BETWEEN ?2 AND ?3
               ORDER BY recorded_at_ms DESC"#,
        )?;

        let rows = stmt.query_map(params![since_ms, lat_min, lat_max], read_row)?;
        let mut nearby = Vec::new();
        for row in rows {
            let record = row??;
            if record.is_near(&location, radius_m) {
                nearby.push(record);
            }
        }
        Ok(nearby)
    }
}

type RowResult = Result<MemoryRecord, MemoryError>;

fn read_row(row: &Row<'_>) -> rusqlite::Result<RowResult> {
    let id: String = row.get(0)?;
    let recorded_at_ms: i64 = row.get(1)?;
    let latitude: f64 = row.get(2)?;
    let longitude: f64 = row.get(3)?;
    let summary: String = row.get(4)?;
    let image_reference: String = row.get(5)?;

    let id = match Uuid::parse_str(&id) {
        Ok(id) => id,
        Err(e) => return Ok(Err(MemoryError::Corrupt(format!("bad id {}: {}", id, e)))),
    };
    let Some(timestamp) = DateTime::<Utc>::from_timestamp_millis(recorded_at_ms) else {
        return Ok(Err(MemoryError::Corrupt(format!(
            "bad timestamp {} on {}",
            recorded_at_ms, id
        ))));
    };

    Ok(Ok(MemoryRecord {
        id,
        location: GeoPoint::new(latitude, longitude),
        timestamp,
        summary,
        image_reference,
    }))
}

#[async_trait]
impl MemoryBank for SqliteMemoryBank {
    async fn was_recently_reported(
        &self,
        location: GeoPoint,
        window: chrono::Duration,
    ) -> Result<bool, MemoryError> {
        let since_ms = self
            .clock
            .now()
            .checked_sub_signed(window)
            .map_or(i64::MIN, |cutoff| cutoff.timestamp_millis());
        let radius_m = self.proximity_radius_m;
        let hit = self
            .with_conn(move |conn| {
                Ok(!Self::nearby_since(conn, location, radius_m, since_ms)?.is_empty())
            })
            .await?;
        debug!("Recent report lookup for {} -> {}", location, hit);
        Ok(hit)
    }

    async fn save_report(&self, report: NewReport) -> Result<MemoryRecord, MemoryError> {
        let record = MemoryRecord::new(report, self.clock.now());
        let row = record.clone();
        self.with_conn(move |conn| {
            conn.execute(
                r#"INSERT INTO reports
                   (id, recorded_at_ms, latitude, longitude, summary, image_reference)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                params![
                    row.id.to_string(),
                    row.timestamp.timestamp_millis(),
                    row.location.latitude,
                    row.location.longitude,
                    row.summary,
                    row.image_reference
                ],
            )?;
            Ok(())
        })
        .await?;
        debug!("Saved report {} at {}", record.id, record.location);
        Ok(record)
    }

    async fn location_history(
        &self,
        location: GeoPoint,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let radius_m = self.proximity_radius_m;
        self.with_conn(move |conn| {
            let mut nearby = Self::nearby_since(conn, location, radius_m, i64::MIN)?;
            nearby.truncate(limit);
            Ok(nearby)
        })
        .await
    }

    async fn all_reports(&self, limit: usize) -> Result<Vec<MemoryRecord>, MemoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare_cached(
                r#"SELECT id, recorded_at_ms, latitude, longitude, summary, image_reference
                   FROM reports ORDER BY recorded_at_ms DESC LIMIT ?1"#,
            )?;
            let rows = stmt.query_map(params![limit], read_row)?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row??);
            }
            Ok(records)
        })
        .await
    }

    fn proximity_radius_m(&self) -> f64 {
        self.proximity_radius_m
    }
}
