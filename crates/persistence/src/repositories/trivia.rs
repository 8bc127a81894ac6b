//! Trivia repository for database operations.

use domain::models::Question;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{assemble_questions, AnswerEntity, QuestionEntity};
use crate::metrics::QueryTimer;

/// Repository for trivia_questions and trivia_answers.
#[derive(Clone)]
pub struct TriviaRepository {
    pool: PgPool,
}

impl TriviaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All questions with their answers, in display order.
    pub async fn list_questions(&self) -> Result<Vec<Question>, sqlx::Error> {
        let timer = QueryTimer::new("list_trivia_questions");
        let questions = sqlx::query_as::<_, QuestionEntity>(
            r#"
            SELECT id, text, question_order
            FROM trivia_questions
            ORDER BY question_order
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        let answers = sqlx::query_as::<_, AnswerEntity>(
            r#"
            SELECT id, question_id, text, is_correct
            FROM trivia_answers
            ORDER BY question_id, text
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(assemble_questions(questions?, answers?))
    }

    /// True when `answer_id` is a correct answer of `question_id`.
    pub async fn is_correct_answer(
        &self,
        question_id: Uuid,
        answer_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("is_correct_answer");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM trivia_answers
                WHERE id = $1 AND question_id = $2 AND is_correct = true
            )
            "#,
        )
        .bind(answer_id)
        .bind(question_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn insert_question(
        &self,
        conn: &mut PgConnection,
        question: &Question,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("insert_trivia_question");
        let result = Self::insert_question_rows(conn, question).await;
        timer.record();
        result
    }

    async fn insert_question_rows(
        conn: &mut PgConnection,
        question: &Question,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO trivia_questions (id, text, question_order) VALUES ($1, $2, $3)")
            .bind(question.id)
            .bind(&question.text)
            .bind(question.order)
            .execute(&mut *conn)
            .await?;

        for answer in &question.answers {
            sqlx::query(
                r#"
                INSERT INTO trivia_answers (id, question_id, text, is_correct)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(answer.id)
            .bind(question.id)
            .bind(&answer.text)
            .bind(answer.is_correct)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}
