// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::{Sqlite, SqlitePool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        quiz::{
            BankQuestion, GenerateQuizRequest, GenerateQuizResponse, PublicQuestion, Quiz,
            QuizQuestion, QuizResponse, SubmitQuizRequest, SubmitQuizResponse,
        },
        quiz_result::{HistoryEntry, HistoryQuiz, QuizResult},
    },
    utils::jwt::Claims,
};

/// Generates a quiz by sampling the question bank.
///
/// Picks `number_of_questions` random bank questions matching the requested
/// topic and difficulty, stores them as an immutable quiz document and
/// returns the questions with the correct options stripped.
pub async fn generate_quiz(
    State(pool): State<SqlitePool>,
    Extension(_claims): Extension<Claims>,
    Json(payload): Json<GenerateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let bank_questions = sqlx::query_as::<_, BankQuestion>(
        r#"
        SELECT id, topic, difficulty, question_text, options, correct_option
        FROM question_bank
        WHERE topic = ? AND difficulty = ?
        ORDER BY RANDOM()
        LIMIT ?
        "#,
    )
    .bind(&payload.topic)
    .bind(payload.difficulty)
    .bind(payload.number_of_questions)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to sample question bank: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if (bank_questions.len() as i64) < payload.number_of_questions {
        return Err(AppError::NotFound(format!(
            "Not enough questions available for topic '{}'",
            payload.topic
        )));
    }

    // Question IDs are 1-based within the quiz.
    let questions: Vec<QuizQuestion> = bank_questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| QuizQuestion {
            question_id: i as i64 + 1,
            question_text: q.question_text,
            options: q.options.0,
            correct_option: q.correct_option,
        })
        .collect();

    let created_at = chrono::Utc::now().naive_utc();

    let quiz_id = sqlx::query(
        r#"
        INSERT INTO quizzes (topic, difficulty, questions, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&payload.topic)
    .bind(payload.difficulty)
    .bind(SqlJson(&questions))
    .bind(created_at)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store generated quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .last_insert_rowid();

    Ok(Json(GenerateQuizResponse {
        quiz_id,
        questions: questions.into_iter().map(PublicQuestion::from).collect(),
        created_at,
    }))
}

/// Fetches a quiz by ID with the correct options stripped.
pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = load_quiz(&pool, id).await?;

    Ok(Json(QuizResponse {
        quiz_id: quiz.id,
        topic: quiz.topic,
        difficulty: quiz.difficulty,
        questions: quiz.questions.0.into_iter().map(PublicQuestion::from).collect(),
        created_at: quiz.created_at,
    }))
}

/// Submits a user's quiz answers and calculates the score.
///
/// * Compares the submitted option labels with the stored questions.
/// * Simple strict string matching; an unanswered question counts as wrong.
/// * Persists one immutable result row per submission.
pub async fn submit_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = load_quiz(&pool, req.quiz_id).await?;

    let total = quiz.questions.0.len() as i64;
    let score = quiz
        .questions
        .0
        .iter()
        .filter(|q| req.answers.get(&q.question_id) == Some(&q.correct_option))
        .count() as i64;

    sqlx::query(
        r#"
        INSERT INTO quiz_results (user_id, quiz_id, score, total_questions, submitted_answers, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(claims.user_id())
    .bind(quiz.id)
    .bind(score)
    .bind(total)
    .bind(SqlJson(&req.answers))
    .bind(chrono::Utc::now().naive_utc())
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store quiz result: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(SubmitQuizResponse {
        score,
        total,
        message: "Quiz submitted successfully".to_string(),
    }))
}

/// Lists the user's most recent attempts, newest first, joined with the quiz
/// they were taken against. Attempts whose quiz was removed out of band are
/// skipped; there is nothing left to review for them.
pub async fn quiz_history(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(limit): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let limit = limit.clamp(1, 100);

    let results = sqlx::query_as::<_, QuizResult>(
        r#"
        SELECT id, user_id, quiz_id, score, total_questions, submitted_answers, created_at
        FROM quiz_results
        WHERE user_id = ?
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(claims.user_id())
    .bind(limit)
    .fetch_all(&pool)
    .await?;

    let quizzes = load_quizzes(&pool, &results).await?;

    let history: Vec<HistoryEntry> = results
        .into_iter()
        .filter_map(|result| {
            let quiz = quizzes.get(&result.quiz_id)?;
            let percentage = result.score as f64 * 100.0 / result.total_questions as f64;
            Some(HistoryEntry {
                quiz: HistoryQuiz {
                    topic: quiz.topic.clone(),
                    difficulty: quiz.difficulty,
                    number_of_questions: quiz.questions.0.len() as i64,
                    // History is post-completion review, so the correct
                    // options are included here.
                    questions: quiz.questions.0.clone(),
                },
                percentage,
                completed_at: result.created_at,
                result,
            })
        })
        .collect();

    Ok(Json(history))
}

async fn load_quiz(pool: &SqlitePool, id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, topic, difficulty, questions, created_at
        FROM quizzes
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Resolves the quizzes referenced by a batch of results in one query.
/// Dangling quiz IDs are simply absent from the returned map.
pub(crate) async fn load_quizzes(
    pool: &SqlitePool,
    results: &[QuizResult],
) -> Result<HashMap<i64, Quiz>, AppError> {
    let mut ids: Vec<i64> = results.iter().map(|r| r.quiz_id).collect();
    ids.sort_unstable();
    ids.dedup();

    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    // Use QueryBuilder for dynamic IN clause
    let mut query_builder = sqlx::QueryBuilder::<Sqlite>::new(
        "SELECT id, topic, difficulty, questions, created_at FROM quizzes WHERE id IN (",
    );

    let mut separated = query_builder.separated(",");
    for id in &ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");

    let quizzes: Vec<Quiz> = query_builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(quizzes.into_iter().map(|q| (q.id, q)).collect())
}
