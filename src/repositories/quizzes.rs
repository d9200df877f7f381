use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::{QuestionOption, Quiz, QuizQuestion};
use crate::db::types::{QuestionType, QuizStatus};
use crate::services::quiz_grading::QuestionKey;

pub(crate) const COLUMNS: &str = "\
    id, course_id, instructor_id, name, description, start_time, \
    duration_minutes, status, created_at, updated_at";

const QUESTION_COLUMNS: &str = "\
    id, quiz_id, question_type, text, points, correct_answer, order_index, created_at";

pub(crate) struct CreateQuiz<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) instructor_id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) duration_minutes: i32,
    pub(crate) status: QuizStatus,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) quiz_id: &'a str,
    pub(crate) question_type: QuestionType,
    pub(crate) text: &'a str,
    pub(crate) points: i32,
    pub(crate) correct_answer: Option<&'a str>,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) struct CreateOption<'a> {
    pub(crate) id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) text: &'a str,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
}

pub(crate) struct UpdateQuiz<'a> {
    pub(crate) name: Option<&'a str>,
    pub(crate) description: Option<&'a str>,
    pub(crate) start_time: Option<PrimitiveDateTime>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) status: Option<QuizStatus>,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct QuizSummaryRow {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) name: String,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) duration_minutes: i32,
    pub(crate) status: QuizStatus,
    pub(crate) question_count: i64,
    pub(crate) total_points: i64,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    quiz: CreateQuiz<'_>,
) -> Result<Quiz, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "INSERT INTO quizzes (
            id, course_id, instructor_id, name, description, start_time,
            duration_minutes, status, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        RETURNING {COLUMNS}"
    ))
    .bind(quiz.id)
    .bind(quiz.course_id)
    .bind(quiz.instructor_id)
    .bind(quiz.name)
    .bind(quiz.description)
    .bind(quiz.start_time)
    .bind(quiz.duration_minutes)
    .bind(quiz.status)
    .bind(quiz.created_at)
    .bind(quiz.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn create_question(
    executor: impl sqlx::PgExecutor<'_>,
    question: CreateQuestion<'_>,
) -> Result<QuizQuestion, sqlx::Error> {
    sqlx::query_as::<_, QuizQuestion>(&format!(
        "INSERT INTO quiz_questions (
            id, quiz_id, question_type, text, points, correct_answer, order_index, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING {QUESTION_COLUMNS}"
    ))
    .bind(question.id)
    .bind(question.quiz_id)
    .bind(question.question_type)
    .bind(question.text)
    .bind(question.points)
    .bind(question.correct_answer)
    .bind(question.order_index)
    .bind(question.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn create_option(
    executor: impl sqlx::PgExecutor<'_>,
    option: CreateOption<'_>,
) -> Result<QuestionOption, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(
        "INSERT INTO question_options (id, question_id, text, is_correct, order_index)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING id, question_id, text, is_correct, order_index",
    )
    .bind(option.id)
    .bind(option.question_id)
    .bind(option.text)
    .bind(option.is_correct)
    .bind(option.order_index)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_questions(
    pool: &PgPool,
    quiz_id: &str,
) -> Result<Vec<QuizQuestion>, sqlx::Error> {
    sqlx::query_as::<_, QuizQuestion>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM quiz_questions WHERE quiz_id = $1 ORDER BY order_index, id"
    ))
    .bind(quiz_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_options(
    pool: &PgPool,
    quiz_id: &str,
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(
        "SELECT o.id, o.question_id, o.text, o.is_correct, o.order_index
         FROM question_options o
         JOIN quiz_questions q ON q.id = o.question_id
         WHERE q.quiz_id = $1
         ORDER BY o.order_index, o.id",
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await
}

/// The grading-relevant slice of every question: type, points and the correct
/// answer or option id.
pub(crate) async fn list_question_keys(
    pool: &PgPool,
    quiz_id: &str,
) -> Result<Vec<QuestionKey>, sqlx::Error> {
    let rows = sqlx::query_as::<
        _,
        (String, QuestionType, i32, Option<String>, Option<String>),
    >(
        "SELECT q.id, q.question_type, q.points, q.correct_answer, o.id AS correct_option_id
         FROM quiz_questions q
         LEFT JOIN question_options o ON o.question_id = q.id AND o.is_correct
         WHERE q.quiz_id = $1
         ORDER BY q.order_index, q.id",
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(question_id, question_type, points, correct_answer, correct_option_id)| {
            QuestionKey { question_id, question_type, points, correct_answer, correct_option_id }
        })
        .collect())
}

pub(crate) async fn total_points(pool: &PgPool, quiz_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(SUM(points), 0) FROM quiz_questions WHERE quiz_id = $1")
        .bind(quiz_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn count_questions(pool: &PgPool, quiz_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM quiz_questions WHERE quiz_id = $1")
        .bind(quiz_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn list_by_course(
    pool: &PgPool,
    course_id: &str,
    status: Option<QuizStatus>,
    skip: i64,
    limit: i64,
) -> Result<Vec<QuizSummaryRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT z.id,
                z.course_id,
                z.name,
                z.start_time,
                z.duration_minutes,
                z.status,
                COUNT(q.id) AS question_count,
                COALESCE(SUM(q.points), 0) AS total_points
         FROM quizzes z
         LEFT JOIN quiz_questions q ON q.quiz_id = z.id
         WHERE z.course_id = ",
    );
    builder.push_bind(course_id);

    if let Some(status) = status {
        builder.push(" AND z.status = ");
        builder.push_bind(status);
    }

    builder.push(" GROUP BY z.id ORDER BY z.start_time DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<QuizSummaryRow>().fetch_all(pool).await
}

pub(crate) async fn count_by_course(
    pool: &PgPool,
    course_id: &str,
    status: Option<QuizStatus>,
) -> Result<i64, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM quizzes WHERE course_id = ");
    builder.push_bind(course_id);

    if let Some(status) = status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    update: UpdateQuiz<'_>,
) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "UPDATE quizzes SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            start_time = COALESCE($3, start_time),
            duration_minutes = COALESCE($4, duration_minutes),
            status = COALESCE($5, status),
            updated_at = $6
         WHERE id = $7
         RETURNING {COLUMNS}"
    ))
    .bind(update.name)
    .bind(update.description)
    .bind(update.start_time)
    .bind(update.duration_minutes)
    .bind(update.status)
    .bind(update.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM quizzes WHERE id = $1").bind(id).execute(pool).await?;
    Ok(())
}
