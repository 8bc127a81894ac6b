//! Passport registration repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::{PassportRegistration, ScanStage};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{PassportRegistrationEntity, PassportStatusDb, StageCountsEntity};
use crate::metrics::QueryTimer;

const SELECT_COLUMNS: &str = r#"
    SELECT id, first_name, last_name, email, phone, status, registration_date, check_in_time,
           entrada_scanned, entrada_time, entrega_scanned, entrega_time,
           completo_scanned, completo_time, sorteo_scanned, sorteo_time,
           created_at, updated_at
    FROM passport_registrations
"#;

/// Flag column for a stage.
fn flag_column(stage: ScanStage) -> &'static str {
    match stage {
        ScanStage::Entrada => "entrada_scanned",
        ScanStage::Entrega => "entrega_scanned",
        ScanStage::Completo => "completo_scanned",
        ScanStage::Sorteo => "sorteo_scanned",
    }
}

fn time_column(stage: ScanStage) -> &'static str {
    match stage {
        ScanStage::Entrada => "entrada_time",
        ScanStage::Entrega => "entrega_time",
        ScanStage::Completo => "completo_time",
        ScanStage::Sorteo => "sorteo_time",
    }
}

/// UPDATE statement setting one stage; entrada also checks the holder in.
fn mark_stage_sql(stage: ScanStage) -> String {
    let check_in = match stage {
        ScanStage::Entrada => ", status = 'CHECKED_IN', check_in_time = $2",
        _ => "",
    };
    format!(
        "UPDATE passport_registrations SET {} = true, {} = $2{}, updated_at = NOW() WHERE id = $1",
        flag_column(stage),
        time_column(stage),
        check_in
    )
}

/// Repository for the passport_registrations table.
#[derive(Clone)]
pub struct PassportRepository {
    pool: PgPool,
}

impl PassportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<PassportRegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_passport_by_id");
        let sql = format!("{} WHERE id = $1", SELECT_COLUMNS);
        let result = sqlx::query_as::<_, PassportRegistrationEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Registrations with `stage` scanned (all when `None`), most recently updated first.
    pub async fn list(
        &self,
        stage: Option<ScanStage>,
        limit: i64,
    ) -> Result<Vec<PassportRegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_passports");
        let filter = stage
            .map(|s| format!("WHERE {} = true", flag_column(s)))
            .unwrap_or_default();
        let sql = format!(
            "{} {} ORDER BY updated_at DESC LIMIT $1",
            SELECT_COLUMNS, filter
        );
        let result = sqlx::query_as::<_, PassportRegistrationEntity>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_passports");
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM passport_registrations")
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn stage_counts(&self) -> Result<StageCountsEntity, sqlx::Error> {
        let timer = QueryTimer::new("passport_stage_counts");
        let result = sqlx::query_as::<_, StageCountsEntity>(
            r#"
            SELECT COUNT(*) FILTER (WHERE entrada_scanned)  AS entrada,
                   COUNT(*) FILTER (WHERE entrega_scanned)  AS entrega,
                   COUNT(*) FILTER (WHERE completo_scanned) AS completo,
                   COUNT(*) FILTER (WHERE sorteo_scanned)   AS sorteo
            FROM passport_registrations
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    // =========================================================================
    // Transactional operations
    // =========================================================================

    /// Locks the registration row and returns its current state.
    pub async fn lock(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<PassportRegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("lock_passport_registration");
        let sql = format!("{} WHERE id = $1 FOR UPDATE", SELECT_COLUMNS);
        let result = sqlx::query_as::<_, PassportRegistrationEntity>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await;
        timer.record();
        result
    }

    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        registration: &PassportRegistration,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("insert_passport");
        let result = sqlx::query(
            r#"
            INSERT INTO passport_registrations (
                id, first_name, last_name, email, phone, status, registration_date,
                check_in_time, entrada_scanned, entrada_time, entrega_scanned, entrega_time,
                completo_scanned, completo_time, sorteo_scanned, sorteo_time,
                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(registration.id)
        .bind(&registration.first_name)
        .bind(&registration.last_name)
        .bind(&registration.email)
        .bind(&registration.phone)
        .bind(PassportStatusDb::from(registration.status))
        .bind(registration.registration_date)
        .bind(registration.check_in_time)
        .bind(registration.entrada_scanned)
        .bind(registration.entrada_time)
        .bind(registration.entrega_scanned)
        .bind(registration.entrega_time)
        .bind(registration.completo_scanned)
        .bind(registration.completo_time)
        .bind(registration.sorteo_scanned)
        .bind(registration.sorteo_time)
        .bind(registration.created_at)
        .bind(registration.updated_at)
        .execute(conn)
        .await;
        timer.record();
        result.map(|_| ())
    }

    pub async fn mark_scanned(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        stage: ScanStage,
        at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("mark_passport_stage");
        let sql = mark_stage_sql(stage);
        let result = sqlx::query(&sql).bind(id).bind(at).execute(conn).await;
        timer.record();
        result.map(|r| r.rows_affected())
    }
}
