//! Trivia question models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of answers a trivia attempt must contain.
pub const TRIVIA_QUESTION_COUNT: usize = 5;

/// A stored trivia question with its answers.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub order: i32,
    pub answers: Vec<Answer>,
}

/// A stored answer option.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub id: Uuid,
    pub question_id: Uuid,
    pub text: String,
    pub is_correct: bool,
}

/// Question as shown to participants (correctness stripped).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: Uuid,
    pub text: String,
    pub order: i32,
    pub answers: Vec<AnswerView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerView {
    pub id: Uuid,
    pub text: String,
}

impl From<Question> for QuestionView {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            text: q.text,
            order: q.order,
            answers: q
                .answers
                .into_iter()
                .map(|a| AnswerView {
                    id: a.id,
                    text: a.text,
                })
                .collect(),
        }
    }
}

/// One submitted answer.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    pub answer_id: Uuid,
}

/// A trivia attempt.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTriviaRequest {
    pub user_id: Uuid,
    pub answers: Vec<SubmittedAnswer>,
}

/// Aggregate outcome of a trivia attempt.
#[derive(Debug, Clone, Serialize)]
pub struct TriviaResult {
    pub correct: bool,
    pub message: String,
}

/// A question to seed, with `(text, is_correct)` answer pairs.
#[derive(Debug, Clone)]
pub struct QuestionSeed {
    pub text: &'static str,
    pub order: i32,
    pub answers: [(&'static str, bool); 4],
}

impl QuestionSeed {
    pub fn into_question(self) -> Question {
        let id = Uuid::new_v4();
        Question {
            id,
            text: self.text.to_string(),
            order: self.order,
            answers: self
                .answers
                .iter()
                .map(|(text, is_correct)| Answer {
                    id: Uuid::new_v4(),
                    question_id: id,
                    text: text.to_string(),
                    is_correct: *is_correct,
                })
                .collect(),
        }
    }
}

/// The default question set used when the question table is empty.
pub fn default_questions() -> Vec<QuestionSeed> {
    vec![
        QuestionSeed {
            text: "¿Cuál es la capital de Ecuador?",
            order: 1,
            answers: [
                ("Quito", true),
                ("Guayaquil", false),
                ("Cuenca", false),
                ("Ambato", false),
            ],
        },
        QuestionSeed {
            text: "¿Cuántos continentes hay en el mundo?",
            order: 2,
            answers: [("5", false), ("6", false), ("7", true), ("8", false)],
        },
        QuestionSeed {
            text: "¿Cuál es el planeta más grande del sistema solar?",
            order: 3,
            answers: [
                ("Marte", false),
                ("Júpiter", true),
                ("Saturno", false),
                ("Neptuno", false),
            ],
        },
        QuestionSeed {
            text: "¿Cuál es el océano más grande del mundo?",
            order: 4,
            answers: [
                ("Atlántico", false),
                ("Índico", false),
                ("Pacífico", true),
                ("Ártico", false),
            ],
        },
        QuestionSeed {
            text: "¿En qué año llegó el hombre a la Luna?",
            order: 5,
            answers: [
                ("1965", false),
                ("1969", true),
                ("1972", false),
                ("1975", false),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_questions_have_one_correct_answer_each() {
        let seeds = default_questions();
        assert_eq!(seeds.len(), TRIVIA_QUESTION_COUNT);
        for seed in seeds {
            let correct = seed.answers.iter().filter(|(_, ok)| *ok).count();
            assert_eq!(correct, 1, "question {} must have one correct answer", seed.order);
        }
    }

    #[test]
    fn test_view_hides_correctness() {
        let question = default_questions().remove(0).into_question();
        let view = QuestionView::from(question.clone());
        assert_eq!(view.answers.len(), 4);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json["answers"][0].get("isCorrect").is_none());
        assert!(question.answers.iter().all(|a| a.question_id == question.id));
    }
}
