use std::collections::HashMap;

use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::QuizAttempt;
use crate::db::types::AttemptStatus;
use crate::repositories;
use crate::services::{attempt_timing, quiz_grading};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FinalizeMode {
    Manual,
    Auto,
}

impl FinalizeMode {
    pub(crate) fn as_label(self) -> &'static str {
        match self {
            FinalizeMode::Manual => "manual",
            FinalizeMode::Auto => "auto",
        }
    }
}

/// Grades the attempt and flips it to submitted through a compare-and-set on
/// status. Returns `None` when another submit won the race; the stored result
/// is never recomputed after that.
pub(crate) async fn finalize(
    pool: &PgPool,
    attempt: &QuizAttempt,
    answers: &HashMap<String, String>,
    submitted_at: PrimitiveDateTime,
    updated_at: PrimitiveDateTime,
    mode: FinalizeMode,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    let questions = repositories::quizzes::list_question_keys(pool, &attempt.quiz_id).await?;
    let grade = quiz_grading::grade_attempt(&questions, answers);

    let finalized = repositories::attempts::finalize(
        pool,
        repositories::attempts::FinalizeAttempt {
            id: &attempt.id,
            answers,
            submitted_at,
            points_earned: grade.points_earned,
            total_points: grade.total_points,
            percentage: grade.percentage,
            letter_grade: grade.letter_grade,
            performance_description: grade.performance_description,
            auto_submitted: mode == FinalizeMode::Auto,
            updated_at,
        },
    )
    .await?;

    if let Some(finalized) = &finalized {
        tracing::info!(
            attempt_id = %finalized.id,
            quiz_id = %finalized.quiz_id,
            points_earned = grade.points_earned,
            total_points = grade.total_points,
            mode = mode.as_label(),
            "Quiz attempt submitted"
        );
        metrics::counter!("attempts_submitted_total", "mode" => mode.as_label()).increment(1);
    }

    Ok(finalized)
}

/// Lazy deadline enforcement: any read or write that observes an expired
/// in-progress attempt closes it first, graded from whatever answers were
/// last recorded and backdated to the deadline.
pub(crate) async fn enforce_deadline(
    pool: &PgPool,
    attempt: QuizAttempt,
    duration_minutes: i32,
    now: PrimitiveDateTime,
) -> Result<QuizAttempt, sqlx::Error> {
    if attempt.status != AttemptStatus::InProgress {
        return Ok(attempt);
    }

    let deadline = attempt_timing::attempt_deadline(attempt.started_at, duration_minutes);
    if now < deadline {
        return Ok(attempt);
    }

    let answers = attempt.answers.0.clone();
    match finalize(pool, &attempt, &answers, deadline, now, FinalizeMode::Auto).await? {
        Some(finalized) => Ok(finalized),
        // Lost the race against another submit; the row is already final.
        None => repositories::attempts::fetch_one_by_id(pool, &attempt.id).await,
    }
}
