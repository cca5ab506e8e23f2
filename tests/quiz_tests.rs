// tests/quiz_tests.rs

use quiz_backend::{config::Config, routes, state::AppState};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashMap;

async fn spawn_app() -> (String, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "quiz_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        question_seed_path: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };
    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

async fn register_and_login(address: &str, client: &reqwest::Client) -> String {
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let email = format!("{}@example.com", username);

    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "email": email,
            "username": username,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Register failed");

    let login = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Login failed")
        .json::<serde_json::Value>()
        .await
        .unwrap();

    login["access_token"].as_str().unwrap().to_string()
}

/// Seeds `count` bank questions for the given topic/difficulty.
/// The correct option is always "a".
async fn seed_bank(pool: &SqlitePool, topic: &str, difficulty: &str, count: i64) {
    for i in 0..count {
        sqlx::query(
            r#"
            INSERT INTO question_bank (topic, difficulty, question_text, options, correct_option)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(topic)
        .bind(difficulty)
        .bind(format!("Question {}", i))
        .bind(
            serde_json::json!({
                "a": "Right",
                "b": "Wrong",
                "c": "Wrong",
                "d": "Wrong"
            })
            .to_string(),
        )
        .bind("a")
        .execute(pool)
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn generate_hides_correct_options() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&address, &client).await;
    seed_bank(&pool, "networking", "easy", 5).await;

    // Act
    let response = client
        .post(format!("{}/api/quiz/generate", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "topic": "networking",
            "difficulty": "easy",
            "number_of_questions": 3
        }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["quiz_id"].as_i64().unwrap() > 0);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    for q in questions {
        assert!(q.get("correct_option").is_none());
        assert!(q["options"]["a"].as_str().is_some());
    }
}

#[tokio::test]
async fn generate_validates_question_count() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&address, &client).await;
    seed_bank(&pool, "networking", "easy", 20).await;

    for bad_count in [0, 11] {
        // Act
        let response = client
            .post(format!("{}/api/quiz/generate", address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({
                "topic": "networking",
                "difficulty": "easy",
                "number_of_questions": bad_count
            }))
            .send()
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status().as_u16(), 400);
    }
}

#[tokio::test]
async fn generate_fails_when_bank_is_too_small() {
    // Arrange: only 2 questions seeded, 5 requested
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&address, &client).await;
    seed_bank(&pool, "gardening", "hard", 2).await;

    // Act
    let response = client
        .post(format!("{}/api/quiz/generate", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "topic": "gardening",
            "difficulty": "hard",
            "number_of_questions": 5
        }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn submit_scores_exact_matches_only() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&address, &client).await;
    seed_bank(&pool, "math", "medium", 4).await;

    let quiz: serde_json::Value = client
        .post(format!("{}/api/quiz/generate", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "topic": "math",
            "difficulty": "medium",
            "number_of_questions": 4
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let quiz_id = quiz["quiz_id"].as_i64().unwrap();

    // Answer the first two correctly, the third wrong, leave the fourth out.
    let mut answers = HashMap::new();
    answers.insert(1, "a".to_string());
    answers.insert(2, "a".to_string());
    answers.insert(3, "b".to_string());

    // Act
    let response = client
        .post(format!("{}/api/quiz/submit", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "quiz_id": quiz_id, "answers": answers }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["score"], 2);
    assert_eq!(body["total"], 4);

    // The attempt is persisted with the submitted answers.
    let (score, total): (i64, i64) =
        sqlx::query_as("SELECT score, total_questions FROM quiz_results WHERE quiz_id = ?")
            .bind(quiz_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(score, 2);
    assert_eq!(total, 4);
}

#[tokio::test]
async fn submit_unknown_quiz_is_not_found() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&address, &client).await;

    // Act
    let response = client
        .post(format!("{}/api/quiz/submit", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "quiz_id": 12345, "answers": { "1": "a" } }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn get_quiz_strips_answers_and_404s_on_missing() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&address, &client).await;
    seed_bank(&pool, "music", "easy", 3).await;

    let quiz: serde_json::Value = client
        .post(format!("{}/api/quiz/generate", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "topic": "music",
            "difficulty": "easy",
            "number_of_questions": 3
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let quiz_id = quiz["quiz_id"].as_i64().unwrap();

    // Act
    let fetched: serde_json::Value = client
        .get(format!("{}/api/quiz/{}", address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(fetched["topic"], "music");
    assert_eq!(fetched["difficulty"], "easy");
    for q in fetched["questions"].as_array().unwrap() {
        assert!(q.get("correct_option").is_none());
    }

    let missing = client
        .get(format!("{}/api/quiz/99999", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn history_lists_attempts_newest_first() {
    // Arrange: two quizzes taken back to back
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&address, &client).await;
    seed_bank(&pool, "physics", "easy", 2).await;
    seed_bank(&pool, "physics", "hard", 2).await;

    let mut quiz_ids = Vec::new();
    for difficulty in ["easy", "hard"] {
        let quiz: serde_json::Value = client
            .post(format!("{}/api/quiz/generate", address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({
                "topic": "physics",
                "difficulty": difficulty,
                "number_of_questions": 2
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let quiz_id = quiz["quiz_id"].as_i64().unwrap();
        quiz_ids.push(quiz_id);

        client
            .post(format!("{}/api/quiz/submit", address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({ "quiz_id": quiz_id, "answers": { "1": "a" } }))
            .send()
            .await
            .unwrap();
    }

    // The two submissions can land on the same timestamp second; order the
    // rows explicitly so the newest-first assertion is deterministic.
    sqlx::query("UPDATE quiz_results SET created_at = datetime(created_at, '-1 minute') WHERE quiz_id = ?")
        .bind(quiz_ids[0])
        .execute(&pool)
        .await
        .unwrap();

    // Act
    let history: Vec<serde_json::Value> = client
        .get(format!("{}/api/quiz/history/10", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["result"]["quiz_id"].as_i64().unwrap(), quiz_ids[1]);
    assert_eq!(history[1]["result"]["quiz_id"].as_i64().unwrap(), quiz_ids[0]);

    let entry = &history[0];
    assert_eq!(entry["quiz"]["topic"], "physics");
    assert_eq!(entry["quiz"]["number_of_questions"], 2);
    // 1 of 2 correct
    assert_eq!(entry["result"]["score"], 1);
    assert_eq!(entry["percentage"].as_f64().unwrap(), 50.0);
    // History is a review surface: correct options are included here.
    assert!(entry["quiz"]["questions"][0].get("correct_option").is_some());

    // The limit caps the list
    let limited: Vec<serde_json::Value> = client
        .get(format!("{}/api/quiz/history/1", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
}
