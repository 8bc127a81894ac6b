//! Reservation repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::{InterestRating, Reservation, ReservationStatus};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{ReservationEntity, ReservationStatusDb};
use crate::metrics::QueryTimer;

/// Repository for the reservations table.
#[derive(Clone)]
pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count of reservations in any status.
    pub async fn count_all(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_reservations");
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reservations")
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ReservationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_reservation_by_id");
        let result = sqlx::query_as::<_, ReservationEntity>(
            r#"
            SELECT id, user_id, timeslot_id, qr_code, status, interest_rating,
                   checked_in_at, created_at
            FROM reservations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_qr(
        &self,
        qr_code: &str,
    ) -> Result<Option<ReservationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_reservation_by_qr");
        let result = sqlx::query_as::<_, ReservationEntity>(
            r#"
            SELECT id, user_id, timeslot_id, qr_code, status, interest_rating,
                   checked_in_at, created_at
            FROM reservations
            WHERE qr_code = $1
            "#,
        )
        .bind(qr_code)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Non-cancelled reservations of a participant, newest first.
    pub async fn active_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ReservationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("active_reservations_for_user");
        let result = sqlx::query_as::<_, ReservationEntity>(
            r#"
            SELECT id, user_id, timeslot_id, qr_code, status, interest_rating,
                   checked_in_at, created_at
            FROM reservations
            WHERE user_id = $1 AND status <> 'CANCELLED'
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Reservations, optionally filtered by status, newest first.
    pub async fn list(
        &self,
        status: Option<ReservationStatus>,
    ) -> Result<Vec<ReservationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_reservations");
        let result = sqlx::query_as::<_, ReservationEntity>(
            r#"
            SELECT id, user_id, timeslot_id, qr_code, status, interest_rating,
                   checked_in_at, created_at
            FROM reservations
            WHERE ($1::reservation_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status.map(ReservationStatusDb::from))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    // =========================================================================
    // Transactional operations
    // =========================================================================

    /// Locks the reservation row and returns its status.
    pub async fn lock_status(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<ReservationStatusDb>, sqlx::Error> {
        let timer = QueryTimer::new("lock_reservation_status");
        let result = sqlx::query_scalar::<_, ReservationStatusDb>(
            "SELECT status FROM reservations WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await;
        timer.record();
        result
    }

    pub async fn count_active_for_user(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_active_reservations_for_user");
        let result = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reservations WHERE user_id = $1 AND status <> 'CANCELLED'",
        )
        .bind(user_id)
        .fetch_one(conn)
        .await;
        timer.record();
        result
    }

    /// Blocks concurrent inserts until the transaction ends, then counts every row.
    pub async fn lock_and_count(&self, conn: &mut PgConnection) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("lock_and_count_reservations");
        let result = match sqlx::query("LOCK TABLE reservations IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *conn)
            .await
        {
            Ok(_) => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reservations")
                    .fetch_one(&mut *conn)
                    .await
            }
            Err(e) => Err(e),
        };
        timer.record();
        result
    }

    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        reservation: &Reservation,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("insert_reservation");
        let result = sqlx::query(
            r#"
            INSERT INTO reservations (id, user_id, timeslot_id, qr_code, status,
                                      interest_rating, checked_in_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.user_id)
        .bind(reservation.timeslot_id)
        .bind(&reservation.qr_code)
        .bind(ReservationStatusDb::from(reservation.status))
        .bind(reservation.interest_rating.map(|r| r.value()))
        .bind(reservation.checked_in_at)
        .bind(reservation.created_at)
        .execute(conn)
        .await;
        timer.record();
        result.map(|_| ())
    }

    pub async fn check_in(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("check_in_reservation");
        let result = sqlx::query(
            "UPDATE reservations SET status = 'USED', checked_in_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(conn)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    pub async fn move_to(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        timeslot_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("move_reservation");
        let result = sqlx::query("UPDATE reservations SET timeslot_id = $2 WHERE id = $1")
            .bind(id)
            .bind(timeslot_id)
            .execute(conn)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    pub async fn rate(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        rating: InterestRating,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("rate_reservation");
        let result = sqlx::query("UPDATE reservations SET interest_rating = $2 WHERE id = $1")
            .bind(id)
            .bind(rating.value())
            .execute(conn)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    pub async fn cancel(&self, conn: &mut PgConnection, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("cancel_reservation");
        let result = sqlx::query("UPDATE reservations SET status = 'CANCELLED' WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
