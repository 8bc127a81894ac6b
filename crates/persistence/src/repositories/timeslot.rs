//! Timeslot repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::{TimeSlot, TimeslotConfig};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{SlotUsageEntity, TimeSlotEntity, TimeslotConfigEntity};
use crate::metrics::QueryTimer;

/// Repository for timeslots and timeslot_configs.
#[derive(Clone)]
pub struct TimeslotRepository {
    pool: PgPool,
}

impl TimeslotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The most recently saved configuration.
    pub async fn latest_config(&self) -> Result<Option<TimeslotConfigEntity>, sqlx::Error> {
        let timer = QueryTimer::new("latest_timeslot_config");
        let result = sqlx::query_as::<_, TimeslotConfigEntity>(
            r#"
            SELECT id, event_dates, duration_minutes, start_hour, end_hour,
                   slots_per_day, updated_by, updated_at
            FROM timeslot_configs
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TimeSlotEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_timeslot_by_id");
        let result = sqlx::query_as::<_, TimeSlotEntity>(
            r#"
            SELECT id, date, start_time, end_time, capacity, created_at
            FROM timeslots
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Every slot with its non-cancelled reservation count, by date then start time.
    pub async fn list_with_usage(&self) -> Result<Vec<SlotUsageEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_timeslots_with_usage");
        let result = sqlx::query_as::<_, SlotUsageEntity>(
            r#"
            SELECT t.id, t.date, t.start_time, t.end_time, t.capacity, t.created_at,
                   COUNT(r.id) AS reserved_count
            FROM timeslots t
            LEFT JOIN reservations r
                   ON r.timeslot_id = t.id AND r.status <> 'CANCELLED'
            GROUP BY t.id
            ORDER BY t.date, t.start_time
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    // =========================================================================
    // Transactional operations
    // =========================================================================

    /// Locks the slot row and returns its capacity.
    pub async fn lock_capacity(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<i32>, sqlx::Error> {
        let timer = QueryTimer::new("lock_timeslot_capacity");
        let result =
            sqlx::query_scalar::<_, i32>("SELECT capacity FROM timeslots WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(conn)
                .await;
        timer.record();
        result
    }

    /// Non-cancelled reservations at a slot, ignoring the ids in `excluding`.
    pub async fn count_active(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        excluding: &[Uuid],
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_active_in_timeslot");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM reservations
            WHERE timeslot_id = $1 AND status <> 'CANCELLED' AND id <> ALL($2)
            "#,
        )
        .bind(id)
        .bind(excluding)
        .fetch_one(conn)
        .await;
        timer.record();
        result
    }

    pub async fn insert_config(
        &self,
        conn: &mut PgConnection,
        config: &TimeslotConfig,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("insert_timeslot_config");
        let result = sqlx::query(
            r#"
            INSERT INTO timeslot_configs (id, event_dates, duration_minutes, start_hour,
                                          end_hour, slots_per_day, updated_by, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(config.id)
        .bind(&config.event_dates)
        .bind(config.duration_minutes)
        .bind(config.start_hour)
        .bind(config.end_hour)
        .bind(config.slots_per_day)
        .bind(&config.updated_by)
        .bind(config.updated_at)
        .execute(conn)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Bulk insert in one statement.
    pub async fn insert_many(
        &self,
        conn: &mut PgConnection,
        slots: &[TimeSlot],
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("insert_timeslots");
        let ids: Vec<Uuid> = slots.iter().map(|s| s.id).collect();
        let dates: Vec<DateTime<Utc>> = slots.iter().map(|s| s.date).collect();
        let starts: Vec<String> = slots.iter().map(|s| s.start_time.clone()).collect();
        let ends: Vec<String> = slots.iter().map(|s| s.end_time.clone()).collect();
        let capacities: Vec<i32> = slots.iter().map(|s| s.capacity).collect();
        let created: Vec<DateTime<Utc>> = slots.iter().map(|s| s.created_at).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO timeslots (id, date, start_time, end_time, capacity, created_at)
            SELECT * FROM UNNEST($1::uuid[], $2::timestamptz[], $3::varchar[],
                                 $4::varchar[], $5::int4[], $6::timestamptz[])
            "#,
        )
        .bind(&ids)
        .bind(&dates)
        .bind(&starts)
        .bind(&ends)
        .bind(&capacities)
        .bind(&created)
        .execute(conn)
        .await;
        timer.record();
        result.map(|r| r.rows_affected())
    }

    pub async fn delete_all(&self, conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_all_timeslots");
        let result = sqlx::query("DELETE FROM timeslots").execute(conn).await;
        timer.record();
        result.map(|r| r.rows_affected())
    }
}
