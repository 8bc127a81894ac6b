//! Participant repository for database operations.

use domain::models::Participant;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::ParticipantEntity;
use crate::metrics::QueryTimer;

/// Repository for the users table.
#[derive(Clone)]
pub struct ParticipantRepository {
    pool: PgPool,
}

impl ParticipantRepository {
    /// Creates a new ParticipantRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a participant by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ParticipantEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_participant_by_id");
        let result = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT id, first_name, last_name, email, whatsapp, partner_id,
                   trivia_completed, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a participant by email, ignoring case.
    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ParticipantEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_participant_by_email");
        let result = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT id, first_name, last_name, email, whatsapp, partner_id,
                   trivia_completed, created_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Participants whose email matches any of `emails`, ignoring case.
    pub async fn find_by_emails(
        &self,
        emails: &[String],
    ) -> Result<Vec<ParticipantEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_participants_by_emails");
        let lowered: Vec<String> = emails.iter().map(|e| e.to_lowercase()).collect();
        let result = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT id, first_name, last_name, email, whatsapp, partner_id,
                   trivia_completed, created_at
            FROM users
            WHERE LOWER(email) = ANY($1)
            "#,
        )
        .bind(&lowered)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// All participants, newest first.
    pub async fn list_all(&self) -> Result<Vec<ParticipantEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_participants");
        let result = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT id, first_name, last_name, email, whatsapp, partner_id,
                   trivia_completed, created_at
            FROM users
            ORDER BY created_at DESC
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

    /// Locks the participant row. Returns false when it does not exist.
    pub async fn lock(&self, conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("lock_participant");
        let result = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await;
        timer.record();
        Ok(result?.is_some())
    }

    pub async fn count_registered(
        &self,
        conn: &mut PgConnection,
        emails: &[String],
    ) -> Result<i64, sqlx::Error> {
        let lowered: Vec<String> = emails.iter().map(|e| e.to_lowercase()).collect();
        let timer = QueryTimer::new("count_registered_participants");
        let result =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE LOWER(email) = ANY($1)")
                .bind(&lowered)
                .fetch_one(conn)
                .await;
        timer.record();
        result
    }

    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        participant: &Participant,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("insert_participant");
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, email, whatsapp, partner_id,
                               trivia_completed, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(participant.id)
        .bind(&participant.first_name)
        .bind(&participant.last_name)
        .bind(&participant.email)
        .bind(&participant.whatsapp)
        .bind(participant.partner_id)
        .bind(participant.trivia_completed)
        .bind(participant.created_at)
        .execute(conn)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Sets `partner_id` on one side. Returns rows affected.
    pub async fn link_partner(
        &self,
        conn: &mut PgConnection,
        participant_id: Uuid,
        partner_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("link_partner");
        let result = sqlx::query("UPDATE users SET partner_id = $2 WHERE id = $1")
            .bind(participant_id)
            .bind(partner_id)
            .execute(conn)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    pub async fn mark_trivia_completed(
        &self,
        conn: &mut PgConnection,
        participant_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("mark_trivia_completed");
        let result = sqlx::query("UPDATE users SET trivia_completed = true WHERE id = $1")
            .bind(participant_id)
            .execute(conn)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
