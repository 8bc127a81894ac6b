//! Registration control repository.

use domain::models::RegistrationControl;
use sqlx::{PgConnection, PgPool};

use crate::entities::RegistrationControlEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct RegistrationControlRepository {
    pool: PgPool,
}

impl RegistrationControlRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn latest(&self) -> Result<Option<RegistrationControlEntity>, sqlx::Error> {
        let timer = QueryTimer::new("latest_registration_control");
        let result = sqlx::query_as::<_, RegistrationControlEntity>(
            r#"
            SELECT id, is_open, reason, updated_by, updated_at
            FROM registration_controls
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn append(
        &self,
        conn: &mut PgConnection,
        control: &RegistrationControl,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("append_registration_control");
        let result = sqlx::query(
            r#"
            INSERT INTO registration_controls (id, is_open, reason, updated_by, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(control.id)
        .bind(control.is_open)
        .bind(&control.reason)
        .bind(&control.updated_by)
        .bind(control.updated_at)
        .execute(conn)
        .await;
        timer.record();
        result.map(|_| ())
    }

    pub async fn clear(&self, conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("clear_registration_controls");
        let result = sqlx::query("DELETE FROM registration_controls")
            .execute(conn)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
