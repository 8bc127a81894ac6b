//! Trivia gate in front of reservations.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::DomainError;
use crate::models::trivia::{default_questions, TRIVIA_QUESTION_COUNT};
use crate::models::{QuestionView, TriviaResult, ValidateTriviaRequest};
use crate::store::{EventStore, UnitOfWork, WriteIntent};

pub struct TriviaService {
    store: Arc<dyn EventStore>,
}

impl TriviaService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Questions in display order, without correctness flags.
    pub async fn questions(&self) -> Result<Vec<QuestionView>, DomainError> {
        Ok(self
            .store
            .list_questions()
            .await?
            .into_iter()
            .map(QuestionView::from)
            .collect())
    }

    /// Checks an attempt. A full pass marks the submitter and partner in one commit.
    pub async fn validate(&self, request: ValidateTriviaRequest) -> Result<TriviaResult, DomainError> {
        let user = self
            .store
            .find_participant(request.user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("User not found".into()))?;

        if request.answers.len() != TRIVIA_QUESTION_COUNT {
            return Err(DomainError::InvalidInput(format!(
                "All {} questions must be answered",
                TRIVIA_QUESTION_COUNT
            )));
        }

        let distinct: HashSet<_> = request.answers.iter().map(|a| a.question_id).collect();
        if distinct.len() != TRIVIA_QUESTION_COUNT {
            return Err(DomainError::InvalidInput(
                "Each question must be answered exactly once".into(),
            ));
        }

        for answer in &request.answers {
            if !self
                .store
                .is_correct_answer(answer.question_id, answer.answer_id)
                .await?
            {
                debug!(user_id = %user.id, question_id = %answer.question_id, "Incorrect trivia answer");
                return Ok(TriviaResult {
                    correct: false,
                    message: "Some answers are incorrect".into(),
                });
            }
        }

        let mut unit = UnitOfWork::new().write(WriteIntent::MarkTriviaCompleted {
            participant_id: user.id,
        });
        if let Some(partner_id) = user.partner_id {
            unit = unit.write(WriteIntent::MarkTriviaCompleted {
                participant_id: partner_id,
            });
        }
        self.store.commit(unit).await?;

        info!(
            user_id = %user.id,
            partner_id = ?user.partner_id,
            "Trivia completed"
        );
        Ok(TriviaResult {
            correct: true,
            message: "Trivia completed. Now pick your timeslot.".into(),
        })
    }

    /// Inserts the default question set when no questions exist. Returns how many were added.
    pub async fn seed_default_questions(&self) -> Result<usize, DomainError> {
        if !self.store.list_questions().await?.is_empty() {
            return Ok(0);
        }

        let questions = default_questions();
        let count = questions.len();
        let unit = questions
            .into_iter()
            .fold(UnitOfWork::new(), |unit, seed| {
                unit.write(WriteIntent::InsertQuestion(seed.into_question()))
            });
        self.store.commit(unit).await?;

        info!(count, "Seeded default trivia questions");
        Ok(count)
    }
}
