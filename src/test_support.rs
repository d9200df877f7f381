use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use sqlx::PgPool;
use time::macros::datetime;
use time::PrimitiveDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::api;
use crate::core::time::ManualClock;
use crate::core::{config::Settings, redis::RedisHandle, state::AppState, time::SystemClock};
use crate::db::models::{Assignment, QuestionOption, Quiz, QuizQuestion};
use crate::db::types::{QuestionType, QuizStatus};
use crate::repositories;

/// Integration tests run only when this points at a disposable database;
/// without it they skip silently so the suite passes with no infrastructure.
pub(crate) const TEST_DATABASE_URL_VAR: &str = "GRADEBOOK_TEST_DATABASE_URL";

/// All tests observe this instant unless they advance the clock.
pub(crate) const TEST_EPOCH: PrimitiveDateTime = datetime!(2025-03-01 12:00:00);

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    pub(crate) clock: Arc<ManualClock>,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env(database_url: &str) {
    dotenvy::dotenv().ok();

    std::env::set_var("GRADEBOOK_ENV", "test");
    std::env::set_var("GRADEBOOK_STRICT_CONFIG", "0");
    std::env::set_var("DATABASE_URL", database_url);
    std::env::set_var("REDIS_HOST", "127.0.0.1");
    std::env::set_var("REDIS_PORT", "6379");
    std::env::set_var("REDIS_DB", "1");
    std::env::remove_var("REDIS_PASSWORD");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
}

/// State for router-level tests that never touch the database: a lazy pool
/// and a disconnected (fail-open) Redis handle.
pub(crate) fn lazy_state(settings: Settings) -> AppState {
    let db = sqlx::PgPool::connect_lazy(&settings.database().database_url()).expect("lazy pool");
    let redis = RedisHandle::new(settings.redis().redis_url());
    AppState::new(settings, db, redis, Arc::new(SystemClock))
}

/// `None` means the test database is not configured; callers return early.
pub(crate) async fn setup_test_context() -> Option<TestContext> {
    let guard = env_lock().await;

    let database_url = std::env::var(TEST_DATABASE_URL_VAR).ok()?;
    set_test_env(&database_url);

    let settings = Settings::load().expect("settings");
    let db = prepare_db(&settings).await;

    let redis = RedisHandle::new(settings.redis().redis_url());
    // Rate limiting fails open, so tests run with or without a live Redis.
    if redis.connect().await.is_ok() {
        reset_redis(settings.redis().redis_url()).await.expect("redis reset");
    }

    let clock = Arc::new(ManualClock::new(TEST_EPOCH.assume_utc()));
    let state = AppState::new(settings, db, redis, clock.clone());
    let app = api::router::router(state.clone());

    Some(TestContext { state, app, clock, _guard: guard })
}

async fn prepare_db(settings: &Settings) -> PgPool {
    let db = crate::db::init_pool(settings).await.expect("db pool");

    reset_public_schema(&db).await.expect("reset schema");
    ensure_schema(&db).await.expect("schema");
    reset_db(&db).await.expect("reset db");
    db
}

async fn reset_public_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("DROP SCHEMA IF EXISTS public CASCADE").execute(pool).await?;
    sqlx::query("CREATE SCHEMA public").execute(pool).await?;
    Ok(())
}

pub(crate) async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let migrations_dir =
        std::env::var("GRADEBOOK_MIGRATIONS_DIR").unwrap_or_else(|_| "migrations".to_string());
    let mut migrator = sqlx::migrate::Migrator::new(std::path::Path::new(&migrations_dir))
        .await
        .map_err(|error| sqlx::Error::Migrate(Box::new(error)))?;
    migrator.set_ignore_missing(true);
    migrator.run(pool).await.map_err(|error| sqlx::Error::Migrate(Box::new(error)))?;
    Ok(())
}

pub(crate) async fn reset_db(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "TRUNCATE course_grades, course_grade_weights, assignment_submissions, assignments, \
         quiz_attempts, question_options, quiz_questions, quizzes RESTART IDENTITY CASCADE",
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn reset_redis(url: String) -> redis::RedisResult<()> {
    let client = redis::Client::open(url)?;
    let mut manager = redis::aio::ConnectionManager::new(client).await?;
    redis::cmd("FLUSHDB").query_async::<_, ()>(&mut manager).await?;
    Ok(())
}

pub(crate) async fn insert_quiz(
    pool: &PgPool,
    course_id: &str,
    status: QuizStatus,
    start_time: PrimitiveDateTime,
    duration_minutes: i32,
) -> Quiz {
    repositories::quizzes::create(
        pool,
        repositories::quizzes::CreateQuiz {
            id: &Uuid::new_v4().to_string(),
            course_id,
            instructor_id: "instructor-1",
            name: "Test quiz",
            description: None,
            start_time,
            duration_minutes,
            status,
            created_at: TEST_EPOCH,
            updated_at: TEST_EPOCH,
        },
    )
    .await
    .expect("insert quiz")
}

pub(crate) async fn insert_question(
    pool: &PgPool,
    quiz_id: &str,
    question_type: QuestionType,
    points: i32,
    correct_answer: Option<&str>,
    order_index: i32,
) -> QuizQuestion {
    repositories::quizzes::create_question(
        pool,
        repositories::quizzes::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            quiz_id,
            question_type,
            text: "Test question",
            points,
            correct_answer,
            order_index,
            created_at: TEST_EPOCH,
        },
    )
    .await
    .expect("insert question")
}

pub(crate) async fn insert_option(
    pool: &PgPool,
    question_id: &str,
    text: &str,
    is_correct: bool,
    order_index: i32,
) -> QuestionOption {
    repositories::quizzes::create_option(
        pool,
        repositories::quizzes::CreateOption {
            id: &Uuid::new_v4().to_string(),
            question_id,
            text,
            is_correct,
            order_index,
        },
    )
    .await
    .expect("insert option")
}

pub(crate) async fn insert_assignment(
    pool: &PgPool,
    course_id: &str,
    due_date: PrimitiveDateTime,
    total_points: f64,
) -> Assignment {
    repositories::assignments::create(
        pool,
        repositories::assignments::CreateAssignment {
            id: &Uuid::new_v4().to_string(),
            course_id,
            instructor_id: "instructor-1",
            title: "Test assignment",
            description: None,
            due_date,
            total_points,
            created_at: TEST_EPOCH,
            updated_at: TEST_EPOCH,
        },
    )
    .await
    .expect("insert assignment")
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
