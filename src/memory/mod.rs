pub mod in_memory_bank;
pub mod memory_bank;
pub mod memory_record;
pub mod sqlite_bank;

pub use in_memory_bank::InMemoryBank;
pub use memory_bank::MemoryBank;
pub use memory_record::{MemoryRecord, NewReport};
pub use sqlite_bank::SqliteMemoryBank;

/// Behavior every backend must share, driven from each backend's tests
#[cfg(test)]
pub(crate) mod conformance {
    use super::{MemoryBank, NewReport};
    use crate::common::{Clock, GeoPoint, ManualClock};
    use chrono::{DateTime, TimeZone, Utc};

    pub fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    fn colombo() -> GeoPoint {
        GeoPoint::new(6.9271, 79.8612)
    }

    pub async fn recent_after_save_and_expiry(bank: &dyn MemoryBank, clock: &ManualClock) {
        let window = chrono::Duration::days(7);
        assert!(!bank.was_recently_reported(colombo(), window).await.unwrap());

        bank.save_report(NewReport::new(colombo(), "Hazards: pothole", "a.jpg"))
            .await
            .unwrap();
        assert!(bank.was_recently_reported(colombo(), window).await.unwrap());

        clock.advance(chrono::Duration::days(2));
        assert!(bank.was_recently_reported(colombo(), window).await.unwrap());

        clock.advance(chrono::Duration::days(6));
        assert!(!bank.was_recently_reported(colombo(), window).await.unwrap());
    }

    pub async fn window_boundary_is_expired(bank: &dyn MemoryBank, clock: &ManualClock) {
        let window = chrono::Duration::days(7);
        let record = bank
            .save_report(NewReport::new(colombo(), "Hazards: crack", "b.jpg"))
            .await
            .unwrap();
        assert_eq!(record.timestamp, clock.now());

        clock.advance(window - chrono::Duration::milliseconds(1));
        assert!(bank.was_recently_reported(colombo(), window).await.unwrap());

        clock.advance(chrono::Duration::milliseconds(1));
        assert_eq!(clock.now() - window, record.timestamp);
        assert!(!bank.was_recently_reported(colombo(), window).await.unwrap());
    }

    pub async fn proximity_matching(bank: &dyn MemoryBank) {
        let window = chrono::Duration::days(7);
        bank.save_report(NewReport::new(colombo(), "Hazards: pothole", "a.jpg"))
            .await
            .unwrap();

        let jitter = GeoPoint::new(6.92712, 79.86122);
        assert!(bank.was_recently_reported(jitter, window).await.unwrap());

        let ten_km_north = GeoPoint::new(6.9271 + 0.09, 79.8612);
        assert!(!bank.was_recently_reported(ten_km_north, window).await.unwrap());

        // roughly 100 m east, outside a 50 m radius
        let next_block = GeoPoint::new(6.9271, 79.8621);
        assert!(bank.proximity_radius_m() < colombo().haversine_distance_m(&next_block));
        assert!(!bank.was_recently_reported(next_block, window).await.unwrap());
    }

    pub async fn oversized_window_does_not_overflow(bank: &dyn MemoryBank, clock: &ManualClock) {
        let window = chrono::Duration::days(200_000_000);
        assert!(!bank.was_recently_reported(colombo(), window).await.unwrap());

        bank.save_report(NewReport::new(colombo(), "Hazards: pothole", "a.jpg"))
            .await
            .unwrap();
        clock.advance(chrono::Duration::days(365));
        assert!(bank.was_recently_reported(colombo(), window).await.unwrap());
        assert!(bank
            .was_recently_reported(colombo(), chrono::Duration::MAX)
            .await
            .unwrap());
    }

    pub async fn history_newest_first(bank: &dyn MemoryBank, clock: &ManualClock) {
        for summary in ["first", "second", "third"] {
            bank.save_report(NewReport::new(colombo(), summary, "a.jpg"))
                .await
                .unwrap();
            clock.advance(chrono::Duration::hours(1));
        }
        bank.save_report(NewReport::new(GeoPoint::new(7.2906, 80.6337), "kandy", "k.jpg"))
            .await
            .unwrap();

        let history = bank.location_history(colombo(), 2).await.unwrap();
        let summaries: Vec<&str> = history.iter().map(|r| r.summary.as_str()).collect();
        assert_eq!(summaries, vec!["third", "second"]);

        let all = bank.all_reports(10).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].summary, "kandy");
    }
}
