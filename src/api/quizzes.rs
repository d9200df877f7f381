use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::pagination::{default_limit, PaginatedResponse};
use crate::core::state::AppState;
use crate::core::time::to_primitive_utc;
use crate::db::types::{QuestionType, QuizStatus};
use crate::repositories;
use crate::schemas::quiz::{
    quiz_to_response, QuestionCreate, QuizCreate, QuizResponse, QuizSummaryResponse, QuizUpdate,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_quiz))
        .route("/:quiz_id", get(get_quiz).patch(update_quiz).delete(delete_quiz))
        .route("/course/:course_id", get(list_course_quizzes))
}

#[derive(Debug, Deserialize)]
struct QuizListQuery {
    #[serde(default)]
    status: Option<QuizStatus>,
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    #[serde(default)]
    force: bool,
}

fn validate_question_shape(question: &QuestionCreate) -> Result<(), ApiError> {
    match question.question_type {
        QuestionType::MultipleChoice => {
            if question.options.len() < 2 {
                return Err(ApiError::BadRequest(
                    "multiple_choice questions need at least two options".to_string(),
                ));
            }
            let correct = question.options.iter().filter(|option| option.is_correct).count();
            if correct != 1 {
                return Err(ApiError::BadRequest(
                    "multiple_choice questions need exactly one correct option".to_string(),
                ));
            }
        }
        QuestionType::TrueFalse => {
            if !matches!(question.correct_answer.as_deref(), Some("true") | Some("false")) {
                return Err(ApiError::BadRequest(
                    "true_false questions need correct_answer \"true\" or \"false\"".to_string(),
                ));
            }
        }
        QuestionType::ShortAnswer => {
            if question.correct_answer.as_deref().unwrap_or("").is_empty() {
                return Err(ApiError::BadRequest(
                    "short_answer questions need a correct_answer".to_string(),
                ));
            }
        }
    }
    Ok(())
}

async fn create_quiz(
    State(state): State<AppState>,
    Json(payload): Json<QuizCreate>,
) -> Result<(StatusCode, Json<QuizResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    for question in &payload.questions {
        validate_question_shape(question)?;
    }

    let now = state.clock().now_primitive();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let quiz_id = Uuid::new_v4().to_string();
    let quiz = repositories::quizzes::create(
        &mut *tx,
        repositories::quizzes::CreateQuiz {
            id: &quiz_id,
            course_id: &payload.course_id,
            instructor_id: &payload.instructor_id,
            name: &payload.name,
            description: payload.description.as_deref(),
            start_time: to_primitive_utc(payload.start_time),
            duration_minutes: payload.duration_minutes,
            status: payload.status,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create quiz"))?;

    let mut questions = Vec::with_capacity(payload.questions.len());
    let mut options = Vec::new();
    for (index, question) in payload.questions.into_iter().enumerate() {
        let question_id = Uuid::new_v4().to_string();
        let created = repositories::quizzes::create_question(
            &mut *tx,
            repositories::quizzes::CreateQuestion {
                id: &question_id,
                quiz_id: &quiz_id,
                question_type: question.question_type,
                text: &question.text,
                points: question.points,
                correct_answer: question.correct_answer.as_deref(),
                order_index: index as i32,
                created_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create question"))?;
        questions.push(created);

        for (option_index, option) in question.options.into_iter().enumerate() {
            let created = repositories::quizzes::create_option(
                &mut *tx,
                repositories::quizzes::CreateOption {
                    id: &Uuid::new_v4().to_string(),
                    question_id: &question_id,
                    text: &option.text,
                    is_correct: option.is_correct,
                    order_index: option_index as i32,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create option"))?;
            options.push(created);
        }
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    Ok((StatusCode::CREATED, Json(quiz_to_response(quiz, questions, options))))
}

async fn get_quiz(
    Path(quiz_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<QuizResponse>, ApiError> {
    let quiz = repositories::quizzes::find_by_id(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    let questions = repositories::quizzes::list_questions(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    let options = repositories::quizzes::list_options(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch options"))?;

    Ok(Json(quiz_to_response(quiz, questions, options)))
}

async fn list_course_quizzes(
    Path(course_id): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<QuizListQuery>,
) -> Result<Json<PaginatedResponse<QuizSummaryResponse>>, ApiError> {
    let items = repositories::quizzes::list_by_course(
        state.db(),
        &course_id,
        query.status,
        query.skip,
        query.limit,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list quizzes"))?;
    let total_count = repositories::quizzes::count_by_course(state.db(), &course_id, query.status)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count quizzes"))?;

    Ok(Json(PaginatedResponse {
        items: items.into_iter().map(QuizSummaryResponse::from).collect(),
        total_count,
        skip: query.skip,
        limit: query.limit,
    }))
}

async fn update_quiz(
    Path(quiz_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<QuizUpdate>,
) -> Result<Json<QuizResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    // Activation requires content: an active quiz with no questions would
    // grade every attempt at 0/0.
    if payload.status == Some(QuizStatus::Active) {
        let question_count = repositories::quizzes::count_questions(state.db(), &quiz_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;
        if question_count == 0 {
            return Err(ApiError::BadRequest(
                "Cannot activate a quiz without questions".to_string(),
            ));
        }
    }

    let quiz = repositories::quizzes::update(
        state.db(),
        &quiz_id,
        repositories::quizzes::UpdateQuiz {
            name: payload.name.as_deref(),
            description: payload.description.as_deref(),
            start_time: payload.start_time.map(to_primitive_utc),
            duration_minutes: payload.duration_minutes,
            status: payload.status,
            updated_at: state.clock().now_primitive(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update quiz"))?
    .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    let questions = repositories::quizzes::list_questions(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    let options = repositories::quizzes::list_options(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch options"))?;

    Ok(Json(quiz_to_response(quiz, questions, options)))
}

async fn delete_quiz(
    Path(quiz_id): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode, ApiError> {
    let quiz = repositories::quizzes::find_by_id(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?;
    if quiz.is_none() {
        return Err(ApiError::NotFound("Quiz not found".to_string()));
    }

    let attempt_count = repositories::attempts::count_by_quiz(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;
    if attempt_count > 0 && !query.force {
        return Err(ApiError::Conflict(format!(
            "Quiz has {attempt_count} attempt(s); pass force=true to delete anyway"
        )));
    }

    repositories::quizzes::delete_by_id(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete quiz"))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests;
