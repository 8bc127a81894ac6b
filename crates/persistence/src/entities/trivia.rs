//! Trivia question and answer entities.

use domain::models::{Answer, Question};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct QuestionEntity {
    pub id: Uuid,
    pub text: String,
    pub question_order: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct AnswerEntity {
    pub id: Uuid,
    pub question_id: Uuid,
    pub text: String,
    pub is_correct: bool,
}

impl From<AnswerEntity> for Answer {
    fn from(entity: AnswerEntity) -> Self {
        Self {
            id: entity.id,
            question_id: entity.question_id,
            text: entity.text,
            is_correct: entity.is_correct,
        }
    }
}

/// Attaches answers to their questions, keeping question order.
pub fn assemble_questions(questions: Vec<QuestionEntity>, answers: Vec<AnswerEntity>) -> Vec<Question> {
    let mut assembled: Vec<Question> = questions
        .into_iter()
        .map(|q| Question {
            id: q.id,
            text: q.text,
            order: q.question_order,
            answers: Vec::new(),
        })
        .collect();

    for answer in answers {
        if let Some(question) = assembled.iter_mut().find(|q| q.id == answer.question_id) {
            question.answers.push(answer.into());
        }
    }
    assembled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_questions_groups_answers() {
        let q1 = Uuid::new_v4();
        let q2 = Uuid::new_v4();
        let questions = vec![
            QuestionEntity {
                id: q1,
                text: "first".into(),
                question_order: 1,
            },
            QuestionEntity {
                id: q2,
                text: "second".into(),
                question_order: 2,
            },
        ];
        let answers = vec![
            AnswerEntity {
                id: Uuid::new_v4(),
                question_id: q2,
                text: "b".into(),
                is_correct: true,
            },
            AnswerEntity {
                id: Uuid::new_v4(),
                question_id: q1,
                text: "a".into(),
                is_correct: false,
            },
            AnswerEntity {
                id: Uuid::new_v4(),
                question_id: Uuid::new_v4(),
                text: "orphan".into(),
                is_correct: true,
            },
        ];

        let assembled = assemble_questions(questions, answers);
        assert_eq!(assembled.len(), 2);
        assert_eq!(assembled[0].order, 1);
        assert_eq!(assembled[0].answers.len(), 1);
        assert_eq!(assembled[1].answers[0].text, "b");
    }
}
