use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::AssignmentSubmission;
use crate::db::types::SubmissionState;

pub(crate) const COLUMNS: &str = "\
    id, assignment_id, student_id, submitted_at, submission_number, is_late, \
    status, points_earned, grade, letter_grade, feedback, graded_at, \
    created_at, updated_at";

pub(crate) struct CreateSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) assignment_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) is_late: bool,
    pub(crate) status: SubmissionState,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) struct GradeSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) status: SubmissionState,
    pub(crate) points_earned: Option<f64>,
    pub(crate) grade: f64,
    pub(crate) letter_grade: &'a str,
    pub(crate) feedback: Option<&'a str>,
    pub(crate) graded_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Inserts the next submission_number for the (assignment, student) pair. The
/// unique constraint turns a concurrent double insert into a unique-violation
/// error; the loser retries once and picks the following number.
pub(crate) async fn create(
    pool: &PgPool,
    submission: CreateSubmission<'_>,
) -> Result<AssignmentSubmission, sqlx::Error> {
    match insert(pool, &submission).await {
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            insert(pool, &submission).await
        }
        other => other,
    }
}

async fn insert(
    pool: &PgPool,
    submission: &CreateSubmission<'_>,
) -> Result<AssignmentSubmission, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "INSERT INTO assignment_submissions (
            id, assignment_id, student_id, submitted_at, submission_number,
            is_late, status, created_at, updated_at
        )
        SELECT $1, $2, $3, $4,
               COALESCE(MAX(submission_number), 0) + 1,
               $5, $6, $7, $8
        FROM assignment_submissions
        WHERE assignment_id = $2 AND student_id = $3
        RETURNING {COLUMNS}"
    ))
    .bind(submission.id)
    .bind(submission.assignment_id)
    .bind(submission.student_id)
    .bind(submission.submitted_at)
    .bind(submission.is_late)
    .bind(submission.status)
    .bind(submission.created_at)
    .bind(submission.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<AssignmentSubmission>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "SELECT {COLUMNS} FROM assignment_submissions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_latest(
    pool: &PgPool,
    assignment_id: &str,
    student_id: &str,
) -> Result<Option<AssignmentSubmission>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "SELECT {COLUMNS} FROM assignment_submissions
         WHERE assignment_id = $1 AND student_id = $2
         ORDER BY submission_number DESC
         LIMIT 1"
    ))
    .bind(assignment_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_assignment(
    pool: &PgPool,
    assignment_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<AssignmentSubmission>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "SELECT {COLUMNS} FROM assignment_submissions
         WHERE assignment_id = $1
         ORDER BY submitted_at DESC
         OFFSET $2 LIMIT $3"
    ))
    .bind(assignment_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_assignment(
    pool: &PgPool,
    assignment_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM assignment_submissions WHERE assignment_id = $1")
        .bind(assignment_id)
        .fetch_one(pool)
        .await
}

/// Writes the score fields. The status argument must stay within the late
/// branch chosen at creation; callers derive it from the frozen is_late flag.
pub(crate) async fn grade(
    pool: &PgPool,
    grade: GradeSubmission<'_>,
) -> Result<Option<AssignmentSubmission>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "UPDATE assignment_submissions SET
            status = $1,
            points_earned = $2,
            grade = $3,
            letter_grade = $4,
            feedback = COALESCE($5, feedback),
            graded_at = $6,
            updated_at = $7
         WHERE id = $8
         RETURNING {COLUMNS}"
    ))
    .bind(grade.status)
    .bind(grade.points_earned)
    .bind(grade.grade)
    .bind(grade.letter_grade)
    .bind(grade.feedback)
    .bind(grade.graded_at)
    .bind(grade.updated_at)
    .bind(grade.id)
    .fetch_optional(pool)
    .await
}
