use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::core::config::Settings;
use crate::db::models::CourseGrade;
use crate::repositories;
use crate::services::points::CourseGradeBreakdown;

/// Stored per-course weights, falling back to the configured defaults when no
/// row exists.
pub(crate) async fn effective_weights(
    pool: &PgPool,
    settings: &Settings,
    course_id: &str,
) -> Result<(f64, f64), sqlx::Error> {
    match repositories::grades::find_weights(pool, course_id).await? {
        Some(weights) => Ok((weights.assignment_weight, weights.quiz_weight)),
        None => Ok((
            settings.grading().default_assignment_weight,
            settings.grading().default_quiz_weight,
        )),
    }
}

/// Computes and persists the materialized course grade for one student.
pub(crate) async fn recalculate_for_student(
    pool: &PgPool,
    course_id: &str,
    student_id: &str,
    assignment_weight: f64,
    quiz_weight: f64,
    now: PrimitiveDateTime,
) -> Result<CourseGrade, sqlx::Error> {
    let assignment_totals =
        repositories::grades::assignment_totals(pool, course_id, student_id).await?;
    let quiz_totals = repositories::grades::quiz_totals(pool, course_id, student_id).await?;

    let breakdown = CourseGradeBreakdown::compute(
        assignment_totals.points_earned,
        assignment_totals.total_points,
        quiz_totals.points_earned,
        quiz_totals.total_points,
        assignment_weight,
        quiz_weight,
    );

    repositories::grades::upsert_course_grade(
        pool,
        repositories::grades::UpsertCourseGrade {
            id: &Uuid::new_v4().to_string(),
            course_id,
            student_id,
            breakdown: &breakdown,
            calculated_at: now,
        },
    )
    .await
}

/// Recomputes every student with grade-bearing data in the course. Driven by
/// the recalculate endpoint and by weight changes, never synchronously with
/// each submission.
pub(crate) async fn recalculate_course(
    pool: &PgPool,
    course_id: &str,
    assignment_weight: f64,
    quiz_weight: f64,
    now: PrimitiveDateTime,
) -> Result<usize, sqlx::Error> {
    let students = repositories::grades::list_students_with_data(pool, course_id).await?;

    for student_id in &students {
        recalculate_for_student(pool, course_id, student_id, assignment_weight, quiz_weight, now)
            .await?;
    }

    tracing::info!(course_id, students = students.len(), "Recalculated course grades");
    metrics::counter!("course_grades_recalculated_total").increment(students.len() as u64);

    Ok(students.len())
}
