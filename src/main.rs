// src/main.rs

use dotenvy::dotenv;
use quiz_backend::config::Config;
use quiz_backend::models::quiz::NewBankQuestion;
use quiz_backend::routes;
use quiz_backend::state::AppState;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Initialize Database Pool
    let connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .expect("DATABASE_URL is not a valid SQLite URL")
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(connect_options)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    // Seed Question Bank
    if let Err(e) = seed_question_bank(&pool, &config).await {
        tracing::error!("Failed to seed question bank: {:?}", e);
    }

    // Create AppState
    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}

/// Loads questions into the bank from `QUESTION_SEED_PATH` (a JSON array of
/// bank entries). Skipped when the variable is unset or the bank already has
/// rows; the bank is otherwise populated by an external producer.
async fn seed_question_bank(
    pool: &SqlitePool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = &config.question_seed_path else {
        return Ok(());
    };

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM question_bank")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    tracing::info!("Seeding question bank from {}", path);
    let raw = tokio::fs::read_to_string(path).await?;
    let questions: Vec<NewBankQuestion> = serde_json::from_str(&raw)?;

    for q in &questions {
        sqlx::query(
            r#"
            INSERT INTO question_bank (topic, difficulty, question_text, options, correct_option)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&q.topic)
        .bind(q.difficulty)
        .bind(&q.question_text)
        .bind(sqlx::types::Json(&q.options))
        .bind(&q.correct_option)
        .execute(pool)
        .await?;
    }
    tracing::info!("Seeded {} questions.", questions.len());

    Ok(())
}
