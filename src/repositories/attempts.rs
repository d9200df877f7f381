use std::collections::HashMap;

use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::QuizAttempt;
use crate::db::types::AttemptStatus;

pub(crate) const COLUMNS: &str = "\
    id, quiz_id, student_id, started_at, submitted_at, status, answers, \
    points_earned, total_points, percentage, letter_grade, \
    performance_description, auto_submitted, created_at, updated_at";

pub(crate) struct CreateAttempt<'a> {
    pub(crate) id: &'a str,
    pub(crate) quiz_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) struct FinalizeAttempt<'a> {
    pub(crate) id: &'a str,
    pub(crate) answers: &'a HashMap<String, String>,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) points_earned: i32,
    pub(crate) total_points: i32,
    pub(crate) percentage: f64,
    pub(crate) letter_grade: &'a str,
    pub(crate) performance_description: &'a str,
    pub(crate) auto_submitted: bool,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, FromRow)]
pub(crate) struct ExpiredAttemptRow {
    #[sqlx(flatten)]
    pub(crate) attempt: QuizAttempt,
    pub(crate) duration_minutes: i32,
}

/// Serializes concurrent starts through the (quiz_id, student_id) unique
/// constraint. Returns false when an attempt already exists for the pair.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    attempt: CreateAttempt<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO quiz_attempts (
            id, quiz_id, student_id, started_at, status, answers, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,'{}'::jsonb,$6,$7)
        ON CONFLICT (quiz_id, student_id) DO NOTHING",
    )
    .bind(attempt.id)
    .bind(attempt.quiz_id)
    .bind(attempt.student_id)
    .bind(attempt.started_at)
    .bind(AttemptStatus::InProgress)
    .bind(attempt.created_at)
    .bind(attempt.updated_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!("SELECT {COLUMNS} FROM quiz_attempts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<QuizAttempt, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!("SELECT {COLUMNS} FROM quiz_attempts WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn find_by_quiz_and_student(
    pool: &PgPool,
    quiz_id: &str,
    student_id: &str,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts WHERE quiz_id = $1 AND student_id = $2"
    ))
    .bind(quiz_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

/// Merges new answers over the stored map; last write per question id wins.
/// Only touches in-progress attempts.
pub(crate) async fn merge_answers(
    pool: &PgPool,
    id: &str,
    answers: &HashMap<String, String>,
    updated_at: PrimitiveDateTime,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "UPDATE quiz_attempts
         SET answers = answers || $1, updated_at = $2
         WHERE id = $3 AND status = $4
         RETURNING {COLUMNS}"
    ))
    .bind(Json(answers))
    .bind(updated_at)
    .bind(id)
    .bind(AttemptStatus::InProgress)
    .fetch_optional(pool)
    .await
}

/// Compare-and-set submission: only an in-progress row is updated, so a race
/// between an explicit submit and the auto-submit path admits exactly one
/// winner. Returns `None` for the loser.
pub(crate) async fn finalize(
    pool: &PgPool,
    finalize: FinalizeAttempt<'_>,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "UPDATE quiz_attempts
         SET status = $1,
             submitted_at = $2,
             answers = $3,
             points_earned = $4,
             total_points = $5,
             percentage = $6,
             letter_grade = $7,
             performance_description = $8,
             auto_submitted = $9,
             updated_at = $10
         WHERE id = $11 AND status = $12
         RETURNING {COLUMNS}"
    ))
    .bind(AttemptStatus::Submitted)
    .bind(finalize.submitted_at)
    .bind(Json(finalize.answers))
    .bind(finalize.points_earned)
    .bind(finalize.total_points)
    .bind(finalize.percentage)
    .bind(finalize.letter_grade)
    .bind(finalize.performance_description)
    .bind(finalize.auto_submitted)
    .bind(finalize.updated_at)
    .bind(finalize.id)
    .bind(AttemptStatus::InProgress)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_quiz(
    pool: &PgPool,
    quiz_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts
         WHERE quiz_id = $1
         ORDER BY started_at DESC
         OFFSET $2 LIMIT $3"
    ))
    .bind(quiz_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_quiz(pool: &PgPool, quiz_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = $1")
        .bind(quiz_id)
        .fetch_one(pool)
        .await
}

/// In-progress attempts whose per-attempt deadline has passed, with the quiz
/// duration needed to backdate `submitted_at`. Deadline is computed in SQL so
/// the sweep sees a consistent cutoff.
pub(crate) async fn list_expired_in_progress(
    pool: &PgPool,
    now: PrimitiveDateTime,
) -> Result<Vec<ExpiredAttemptRow>, sqlx::Error> {
    sqlx::query_as::<_, ExpiredAttemptRow>(
        "SELECT a.id, a.quiz_id, a.student_id, a.started_at, a.submitted_at, a.status,
                a.answers, a.points_earned, a.total_points, a.percentage, a.letter_grade,
                a.performance_description, a.auto_submitted, a.created_at, a.updated_at,
                z.duration_minutes
         FROM quiz_attempts a
         JOIN quizzes z ON z.id = a.quiz_id
         WHERE a.status = $1
           AND a.started_at + make_interval(mins => z.duration_minutes) <= $2
         ORDER BY a.started_at",
    )
    .bind(AttemptStatus::InProgress)
    .bind(now)
    .fetch_all(pool)
    .await
}
