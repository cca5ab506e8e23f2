// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Quiz difficulty. Stored as lowercase text in the database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// The four labeled answer options of a multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOptions {
    pub a: String,
    pub b: String,
    pub c: String,
    pub d: String,
}

/// One question inside a stored quiz. `question_id` is 1-based within the quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question_id: i64,
    pub question_text: String,
    pub options: QuestionOptions,
    pub correct_option: String,
}

/// Represents the 'quizzes' table in the database.
/// The question list is stored as a JSON column; quizzes are immutable once created.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub topic: String,
    pub difficulty: Difficulty,
    pub questions: Json<Vec<QuizQuestion>>,
    pub created_at: chrono::NaiveDateTime,
}

/// DTO for sending a question to the client before submission
/// (excludes the correct option).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub question_id: i64,
    pub question_text: String,
    pub options: QuestionOptions,
}

impl From<QuizQuestion> for PublicQuestion {
    fn from(q: QuizQuestion) -> Self {
        Self {
            question_id: q.question_id,
            question_text: q.question_text,
            options: q.options,
        }
    }
}

/// Represents the 'question_bank' table the generator samples from.
/// The bank itself is populated out of band (seed file or external producer).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BankQuestion {
    pub id: i64,
    pub topic: String,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub options: Json<QuestionOptions>,
    pub correct_option: String,
}

/// One entry of a question seed file (`QUESTION_SEED_PATH`).
#[derive(Debug, Deserialize)]
pub struct NewBankQuestion {
    pub topic: String,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub options: QuestionOptions,
    pub correct_option: String,
}

/// DTO for requesting a new quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[validate(length(min = 1, max = 200, message = "Topic must not be empty."))]
    pub topic: String,
    pub difficulty: Difficulty,
    #[validate(range(
        min = 1,
        max = 10,
        message = "Number of questions must be between 1 and 10."
    ))]
    pub number_of_questions: i64,
}

/// DTO returned by quiz generation.
#[derive(Debug, Serialize)]
pub struct GenerateQuizResponse {
    pub quiz_id: i64,
    pub questions: Vec<PublicQuestion>,
    pub created_at: chrono::NaiveDateTime,
}

/// DTO returned when fetching a quiz that has not been completed yet.
#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub quiz_id: i64,
    pub topic: String,
    pub difficulty: Difficulty,
    pub questions: Vec<PublicQuestion>,
    pub created_at: chrono::NaiveDateTime,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub quiz_id: i64,

    /// User's answers map.
    /// Key: Question ID (i64)
    /// Value: User's selected option label (e.g. "a")
    pub answers: std::collections::HashMap<i64, String>,
}

/// DTO returned after grading a submission.
#[derive(Debug, Serialize)]
pub struct SubmitQuizResponse {
    pub score: i64,
    pub total: i64,
    pub message: String,
}
