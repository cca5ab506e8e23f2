// src/models/quiz_result.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use std::collections::HashMap;

use crate::models::quiz::{Difficulty, QuizQuestion};

/// Represents the 'quiz_results' table in the database.
/// One row per completed attempt; immutable once written.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizResult {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub score: i64,
    pub total_questions: i64,

    /// The answers as submitted, kept so history can replay the attempt.
    pub submitted_answers: Json<HashMap<i64, String>>,

    pub created_at: chrono::NaiveDateTime,
}

/// Quiz details joined into a history entry. Includes the correct options,
/// since history is a post-completion review surface.
#[derive(Debug, Serialize)]
pub struct HistoryQuiz {
    pub topic: String,
    pub difficulty: Difficulty,
    pub number_of_questions: i64,
    pub questions: Vec<QuizQuestion>,
}

/// One completed attempt together with the quiz it was taken against.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub result: QuizResult,
    pub quiz: HistoryQuiz,
    pub percentage: f64,
    pub completed_at: chrono::NaiveDateTime,
}
