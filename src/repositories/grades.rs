use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::{CourseGrade, CourseGradeWeights};
use crate::db::types::AttemptStatus;
use crate::services::points::CourseGradeBreakdown;

pub(crate) const COURSE_GRADE_COLUMNS: &str = "\
    id, course_id, student_id, assignment_points_earned, assignment_total_points, \
    quiz_points_earned, quiz_total_points, assignment_percentage, quiz_percentage, \
    assignment_weight, quiz_weight, final_percentage, letter_grade, grade_point, \
    performance_description, calculated_at";

#[derive(Debug, FromRow)]
pub(crate) struct CategoryTotals {
    pub(crate) points_earned: f64,
    pub(crate) total_points: f64,
}

#[derive(Debug, FromRow)]
pub(crate) struct GpaRow {
    pub(crate) gpa: Option<f64>,
    pub(crate) courses_counted: i64,
}

pub(crate) struct UpsertCourseGrade<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) breakdown: &'a CourseGradeBreakdown,
    pub(crate) calculated_at: PrimitiveDateTime,
}

pub(crate) async fn find_weights(
    pool: &PgPool,
    course_id: &str,
) -> Result<Option<CourseGradeWeights>, sqlx::Error> {
    sqlx::query_as::<_, CourseGradeWeights>(
        "SELECT course_id, assignment_weight, quiz_weight, updated_at
         FROM course_grade_weights WHERE course_id = $1",
    )
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn upsert_weights(
    pool: &PgPool,
    course_id: &str,
    assignment_weight: f64,
    quiz_weight: f64,
    updated_at: PrimitiveDateTime,
) -> Result<CourseGradeWeights, sqlx::Error> {
    sqlx::query_as::<_, CourseGradeWeights>(
        "INSERT INTO course_grade_weights (course_id, assignment_weight, quiz_weight, updated_at)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (course_id) DO UPDATE SET
            assignment_weight = EXCLUDED.assignment_weight,
            quiz_weight = EXCLUDED.quiz_weight,
            updated_at = EXCLUDED.updated_at
         RETURNING course_id, assignment_weight, quiz_weight, updated_at",
    )
    .bind(course_id)
    .bind(assignment_weight)
    .bind(quiz_weight)
    .bind(updated_at)
    .fetch_one(pool)
    .await
}

/// Per assignment only the latest submission counts, and only once it has
/// been graded. An assignment whose latest submission is ungraded contributes
/// to neither side of the ratio.
pub(crate) async fn assignment_totals(
    pool: &PgPool,
    course_id: &str,
    student_id: &str,
) -> Result<CategoryTotals, sqlx::Error> {
    sqlx::query_as::<_, CategoryTotals>(
        "SELECT COALESCE(SUM(g.points_earned), 0)::float8 AS points_earned,
                COALESCE(SUM(g.total_points), 0)::float8 AS total_points
         FROM (
             SELECT DISTINCT ON (s.assignment_id)
                    s.points_earned, a.total_points
             FROM assignment_submissions s
             JOIN assignments a ON a.id = s.assignment_id
             WHERE a.course_id = $1
               AND s.student_id = $2
             ORDER BY s.assignment_id, s.submission_number DESC
         ) g
         WHERE g.points_earned IS NOT NULL",
    )
    .bind(course_id)
    .bind(student_id)
    .fetch_one(pool)
    .await
}

/// Sums the frozen results of submitted attempts. In-progress attempts are
/// invisible to the course grade.
pub(crate) async fn quiz_totals(
    pool: &PgPool,
    course_id: &str,
    student_id: &str,
) -> Result<CategoryTotals, sqlx::Error> {
    sqlx::query_as::<_, CategoryTotals>(
        "SELECT COALESCE(SUM(a.points_earned), 0)::float8 AS points_earned,
                COALESCE(SUM(a.total_points), 0)::float8 AS total_points
         FROM quiz_attempts a
         JOIN quizzes z ON z.id = a.quiz_id
         WHERE z.course_id = $1
           AND a.student_id = $2
           AND a.status = $3",
    )
    .bind(course_id)
    .bind(student_id)
    .bind(AttemptStatus::Submitted)
    .fetch_one(pool)
    .await
}

/// Every student with at least one submission or submitted attempt in the
/// course. Drives full-course recalculation.
pub(crate) async fn list_students_with_data(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT s.student_id
         FROM assignment_submissions s
         JOIN assignments a ON a.id = s.assignment_id
         WHERE a.course_id = $1
         UNION
         SELECT t.student_id
         FROM quiz_attempts t
         JOIN quizzes z ON z.id = t.quiz_id
         WHERE z.course_id = $1 AND t.status = $2
         ORDER BY 1",
    )
    .bind(course_id)
    .bind(AttemptStatus::Submitted)
    .fetch_all(pool)
    .await
}

pub(crate) async fn upsert_course_grade(
    pool: &PgPool,
    upsert: UpsertCourseGrade<'_>,
) -> Result<CourseGrade, sqlx::Error> {
    let breakdown = upsert.breakdown;

    sqlx::query_as::<_, CourseGrade>(&format!(
        "INSERT INTO course_grades (
            id, course_id, student_id,
            assignment_points_earned, assignment_total_points,
            quiz_points_earned, quiz_total_points,
            assignment_percentage, quiz_percentage,
            assignment_weight, quiz_weight,
            final_percentage, letter_grade, grade_point, performance_description,
            calculated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16)
        ON CONFLICT (course_id, student_id) DO UPDATE SET
            assignment_points_earned = EXCLUDED.assignment_points_earned,
            assignment_total_points = EXCLUDED.assignment_total_points,
            quiz_points_earned = EXCLUDED.quiz_points_earned,
            quiz_total_points = EXCLUDED.quiz_total_points,
            assignment_percentage = EXCLUDED.assignment_percentage,
            quiz_percentage = EXCLUDED.quiz_percentage,
            assignment_weight = EXCLUDED.assignment_weight,
            quiz_weight = EXCLUDED.quiz_weight,
            final_percentage = EXCLUDED.final_percentage,
            letter_grade = EXCLUDED.letter_grade,
            grade_point = EXCLUDED.grade_point,
            performance_description = EXCLUDED.performance_description,
            calculated_at = EXCLUDED.calculated_at
        RETURNING {COURSE_GRADE_COLUMNS}"
    ))
    .bind(upsert.id)
    .bind(upsert.course_id)
    .bind(upsert.student_id)
    .bind(breakdown.assignment_points_earned)
    .bind(breakdown.assignment_total_points)
    .bind(breakdown.quiz_points_earned)
    .bind(breakdown.quiz_total_points)
    .bind(breakdown.assignment_percentage)
    .bind(breakdown.quiz_percentage)
    .bind(breakdown.assignment_weight)
    .bind(breakdown.quiz_weight)
    .bind(breakdown.final_percentage)
    .bind(breakdown.letter_grade)
    .bind(breakdown.grade_point)
    .bind(breakdown.performance_description)
    .bind(upsert.calculated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_course_grade(
    pool: &PgPool,
    course_id: &str,
    student_id: &str,
) -> Result<Option<CourseGrade>, sqlx::Error> {
    sqlx::query_as::<_, CourseGrade>(&format!(
        "SELECT {COURSE_GRADE_COLUMNS} FROM course_grades
         WHERE course_id = $1 AND student_id = $2"
    ))
    .bind(course_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

/// Mean grade point over the student's materialized course grades. Courses
/// without a letter yet are excluded from both the average and the count.
pub(crate) async fn student_gpa(pool: &PgPool, student_id: &str) -> Result<GpaRow, sqlx::Error> {
    sqlx::query_as::<_, GpaRow>(
        "SELECT AVG(grade_point) AS gpa, COUNT(grade_point) AS courses_counted
         FROM course_grades
         WHERE student_id = $1 AND grade_point IS NOT NULL",
    )
    .bind(student_id)
    .fetch_one(pool)
    .await
}
