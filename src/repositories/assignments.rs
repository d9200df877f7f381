use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Assignment;

pub(crate) const COLUMNS: &str = "\
    id, course_id, instructor_id, title, description, due_date, total_points, \
    created_at, updated_at";

pub(crate) struct CreateAssignment<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) instructor_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) due_date: PrimitiveDateTime,
    pub(crate) total_points: f64,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) struct UpdateAssignment<'a> {
    pub(crate) title: Option<&'a str>,
    pub(crate) description: Option<&'a str>,
    pub(crate) due_date: Option<PrimitiveDateTime>,
    pub(crate) total_points: Option<f64>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    assignment: CreateAssignment<'_>,
) -> Result<Assignment, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "INSERT INTO assignments (
            id, course_id, instructor_id, title, description, due_date,
            total_points, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {COLUMNS}"
    ))
    .bind(assignment.id)
    .bind(assignment.course_id)
    .bind(assignment.instructor_id)
    .bind(assignment.title)
    .bind(assignment.description)
    .bind(assignment.due_date)
    .bind(assignment.total_points)
    .bind(assignment.created_at)
    .bind(assignment.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!("SELECT {COLUMNS} FROM assignments WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_course(
    pool: &PgPool,
    course_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<Assignment>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM assignments WHERE course_id = "
    ));
    builder.push_bind(course_id);
    builder.push(" ORDER BY due_date OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<Assignment>().fetch_all(pool).await
}

pub(crate) async fn count_by_course(pool: &PgPool, course_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM assignments WHERE course_id = $1")
        .bind(course_id)
        .fetch_one(pool)
        .await
}

/// Due-date edits leave existing submissions' lateness alone.
pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    update: UpdateAssignment<'_>,
) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "UPDATE assignments SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            due_date = COALESCE($3, due_date),
            total_points = COALESCE($4, total_points),
            updated_at = $5
         WHERE id = $6
         RETURNING {COLUMNS}"
    ))
    .bind(update.title)
    .bind(update.description)
    .bind(update.due_date)
    .bind(update.total_points)
    .bind(update.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}
