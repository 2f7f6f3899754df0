use sqlx::{FromRow, SqlitePool};

/// One recorded stop arrival. Immutable once appended.
#[derive(Debug, Clone, FromRow)]
pub struct ArrivalEvent {
    pub vehicle_id: String,
    pub route_id: String,
    pub stop_id: String,
    /// RFC 3339 UTC timestamp; stored as TEXT so range queries compare
    /// lexicographically
    pub timestamp: String,
}

/// Append-only SQLite store for arrival events.
#[derive(Clone)]
pub struct ArrivalStore {
    pool: SqlitePool,
}

impl ArrivalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, event: &ArrivalEvent) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO arrival_events (vehicle_id, route_id, stop_id, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(&event.vehicle_id)
        .bind(&event.route_id)
        .bind(&event.stop_id)
        .bind(&event.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Whether the vehicle already has an event at this stop at or after
    /// `since` (RFC 3339).
    pub async fn recent_exists(
        &self,
        vehicle_id: &str,
        stop_id: &str,
        since: &str,
    ) -> Result<bool, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM arrival_events WHERE vehicle_id = ? AND stop_id = ? AND timestamp >= ?",
        )
        .bind(vehicle_id)
        .bind(stop_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// All events for a route at or after `since`, ordered by
    /// `(vehicle_id, timestamp)` so callers can scan trips vehicle by
    /// vehicle.
    pub async fn events_since(
        &self,
        route_id: &str,
        since: &str,
    ) -> Result<Vec<ArrivalEvent>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT vehicle_id, route_id, stop_id, timestamp
            FROM arrival_events
            WHERE route_id = ? AND timestamp >= ?
            ORDER BY vehicle_id ASC, timestamp ASC
            "#,
        )
        .bind(route_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM arrival_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> ArrivalStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        ArrivalStore::new(pool)
    }

    fn make_event(vehicle_id: &str, stop_id: &str, timestamp: &str) -> ArrivalEvent {
        ArrivalEvent {
            vehicle_id: vehicle_id.to_string(),
            route_id: "route-1".to_string(),
            stop_id: stop_id.to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    #[tokio::test]
    async fn events_come_back_grouped_by_vehicle_then_time() {
        let store = test_store().await;
        store
            .append(&make_event("BUS-202", "s1", "2026-08-01T08:00:00+00:00"))
            .await
            .unwrap();
        store
            .append(&make_event("BUS-101", "s2", "2026-08-01T08:10:00+00:00"))
            .await
            .unwrap();
        store
            .append(&make_event("BUS-101", "s1", "2026-08-01T08:00:00+00:00"))
            .await
            .unwrap();

        let events = store
            .events_since("route-1", "2026-08-01T00:00:00+00:00")
            .await
            .unwrap();
        let order: Vec<(&str, &str)> = events
            .iter()
            .map(|e| (e.vehicle_id.as_str(), e.stop_id.as_str()))
            .collect();
        assert_eq!(
            order,
            [("BUS-101", "s1"), ("BUS-101", "s2"), ("BUS-202", "s1")]
        );
    }

    #[tokio::test]
    async fn events_before_the_window_are_excluded() {
        let store = test_store().await;
        store
            .append(&make_event("BUS-101", "s1", "2026-07-01T08:00:00+00:00"))
            .await
            .unwrap();
        store
            .append(&make_event("BUS-101", "s2", "2026-08-01T08:00:00+00:00"))
            .await
            .unwrap();

        let events = store
            .events_since("route-1", "2026-07-20T00:00:00+00:00")
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].stop_id, "s2");
    }

    #[tokio::test]
    async fn events_for_other_routes_are_excluded() {
        let store = test_store().await;
        let mut other = make_event("BUS-101", "s1", "2026-08-01T08:00:00+00:00");
        other.route_id = "route-2".to_string();
        store.append(&other).await.unwrap();

        let events = store
            .events_since("route-1", "2026-07-20T00:00:00+00:00")
            .await
            .unwrap();
        assert!(events.is_empty());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn recent_exists_respects_the_cutoff() {
        let store = test_store().await;
        store
            .append(&make_event("BUS-101", "s1", "2026-08-01T08:00:00+00:00"))
            .await
            .unwrap();

        assert!(store
            .recent_exists("BUS-101", "s1", "2026-08-01T07:59:00+00:00")
            .await
            .unwrap());
        assert!(!store
            .recent_exists("BUS-101", "s1", "2026-08-01T08:01:00+00:00")
            .await
            .unwrap());
        assert!(!store
            .recent_exists("BUS-101", "s2", "2026-08-01T07:59:00+00:00")
            .await
            .unwrap());
    }
}
