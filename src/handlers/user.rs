// src/handlers/user.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::quiz::load_quizzes,
    models::{
        quiz_result::QuizResult,
        user::{ChangePasswordRequest, UpdateProfileRequest, User, UserResponse},
    },
    stats::{self, BasicStats},
    utils::{
        hash::{hash_password, verify_password},
        jwt::Claims,
    },
};

/// Get current user's profile.
pub async fn get_me(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = fetch_user(&pool, claims.user_id()).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Changes the current user's password.
///
/// The current password must verify against the stored hash before the new
/// one is hashed and persisted; on a mismatch nothing is written.
pub async fn change_password(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = fetch_user(&pool, claims.user_id()).await?;

    if !verify_password(&payload.current_password, &user.password)? {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hashed_password = hash_password(&payload.new_password)?;

    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(&new_hashed_password)
        .bind(user.id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update password: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(json!({ "message": "Password changed successfully" })))
}

/// Updates username and/or email for the current user.
///
/// Each supplied field that differs from the current value is checked for
/// uniqueness against all other users before anything is written; a taken
/// value aborts the whole update. The check-then-write pair is not atomic
/// against concurrent writers; the UNIQUE indexes on `users` are the
/// store-level backstop, and a lost race surfaces as a generic 500.
pub async fn update_profile(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let mut user = fetch_user(&pool, claims.user_id()).await?;

    if let Some(username) = &payload.username {
        if username != &user.username && username_taken(&pool, username, user.id).await? {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
    }

    if let Some(email) = &payload.email {
        if email != &user.email && email_taken(&pool, email, user.id).await? {
            return Err(AppError::Conflict("Email already taken".to_string()));
        }
    }

    if let Some(username) = payload.username {
        user.username = username;
    }
    if let Some(email) = payload.email {
        user.email = email;
    }

    sqlx::query("UPDATE users SET username = ?, email = ? WHERE id = ?")
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update profile: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": UserResponse::from(user),
    })))
}

/// Count, mean, max and min of the user's scores in one aggregate query.
/// A user with no attempts gets an explicit `null`, not an error.
pub async fn get_basic_statistics(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let row = sqlx::query_as::<_, BasicStatsRow>(
        r#"
        SELECT
            COUNT(*) AS total_quizzes,
            AVG(score) AS average_score,
            MAX(score) AS highest_score,
            MIN(score) AS lowest_score
        FROM quiz_results
        WHERE user_id = ?
        "#,
    )
    .bind(claims.user_id())
    .fetch_one(&pool)
    .await?;

    let stats = (row.total_quizzes > 0).then(|| BasicStats {
        total_quizzes: row.total_quizzes,
        average_score: row.average_score.unwrap_or(0.0),
        highest_score: row.highest_score.unwrap_or(0),
        lowest_score: row.lowest_score.unwrap_or(0),
    });

    Ok(Json(stats))
}

/// Full statistics report: overall totals plus difficulty and topic
/// breakdowns, aggregated in a single pass over the user's results.
pub async fn get_statistics(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, QuizResult>(
        r#"
        SELECT id, user_id, quiz_id, score, total_questions, submitted_answers, created_at
        FROM quiz_results
        WHERE user_id = ?
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    let quizzes = load_quizzes(&pool, &results).await?;

    let report = stats::aggregate(&results, &quizzes, chrono::Utc::now().naive_utc());

    Ok(Json(report))
}

/// Helper struct for the aggregate row; the MIN/MAX/AVG columns are NULL
/// when the user has no results.
#[derive(sqlx::FromRow)]
struct BasicStatsRow {
    total_quizzes: i64,
    average_score: Option<f64>,
    highest_score: Option<i64>,
    lowest_score: Option<i64>,
}

async fn fetch_user(pool: &SqlitePool, user_id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(
        "SELECT id, email, username, password, joined_at FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))
}

async fn username_taken(pool: &SqlitePool, username: &str, user_id: i64) -> Result<bool, AppError> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ? AND id != ?")
        .bind(username)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(existing.is_some())
}

async fn email_taken(pool: &SqlitePool, email: &str, user_id: i64) -> Result<bool, AppError> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = ? AND id != ?")
        .bind(email)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(existing.is_some())
}
