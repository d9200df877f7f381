use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::pagination::{PageQuery, PaginatedResponse};
use crate::core::state::AppState;
use crate::db::models::{Quiz, QuizAttempt};
use crate::db::types::{AttemptStatus, QuizStatus};
use crate::repositories;
use crate::schemas::attempt::{
    AttemptAnswers, AttemptResponse, AttemptStart, AttemptSubmit, TimeRemainingResponse,
};
use crate::services::attempt_finalize::{self, FinalizeMode};
use crate::services::attempt_timing::{self, QuizWindow};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(start_attempt))
        .route("/submit", post(submit_attempt))
        .route("/:attempt_id", put(save_answers))
        .route("/quiz/:quiz_id", get(list_quiz_attempts))
        .route("/quiz/:quiz_id/student/:student_id", get(latest_attempt))
        .route("/quiz/:quiz_id/time-remaining/:student_id", get(time_remaining))
}

async fn fetch_active_quiz(state: &AppState, quiz_id: &str) -> Result<Quiz, ApiError> {
    let quiz = repositories::quizzes::find_by_id(state.db(), quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    if quiz.status != QuizStatus::Active {
        return Err(ApiError::BadRequest("Quiz is not active".to_string()));
    }

    Ok(quiz)
}

fn ensure_window_open(quiz: &Quiz, now: time::PrimitiveDateTime) -> Result<(), ApiError> {
    match attempt_timing::quiz_window(quiz.start_time, quiz.duration_minutes, now) {
        QuizWindow::NotStarted => {
            Err(ApiError::BadRequest("Quiz has not started yet".to_string()))
        }
        QuizWindow::Ended => Err(ApiError::BadRequest("Quiz has ended".to_string())),
        QuizWindow::Open => Ok(()),
    }
}

/// Closes the attempt first if its deadline already passed, so every caller
/// observes a consistent state.
async fn enforce_deadline(
    state: &AppState,
    attempt: QuizAttempt,
    duration_minutes: i32,
) -> Result<QuizAttempt, ApiError> {
    attempt_finalize::enforce_deadline(
        state.db(),
        attempt,
        duration_minutes,
        state.clock().now_primitive(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to enforce attempt deadline"))
}

async fn start_attempt(
    State(state): State<AppState>,
    Json(payload): Json<AttemptStart>,
) -> Result<(StatusCode, Json<AttemptResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let quiz = fetch_active_quiz(&state, &payload.quiz_id).await?;

    // The existing-attempt lookup comes before the window gate: a running
    // attempt stays resumable after the quiz window closes, until its own
    // deadline expires it.
    if let Some(attempt) = repositories::attempts::find_by_quiz_and_student(
        state.db(),
        &payload.quiz_id,
        &payload.student_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
    {
        let attempt = enforce_deadline(&state, attempt, quiz.duration_minutes).await?;
        if attempt.status == AttemptStatus::Submitted {
            return Err(ApiError::Conflict("Quiz already attempted".to_string()));
        }
        // Resume: the running attempt is returned as-is, started_at untouched.
        return Ok((StatusCode::OK, Json(attempt.into())));
    }

    let now = state.clock().now_primitive();
    ensure_window_open(&quiz, now)?;
    let created = repositories::attempts::create(
        state.db(),
        repositories::attempts::CreateAttempt {
            id: &Uuid::new_v4().to_string(),
            quiz_id: &payload.quiz_id,
            student_id: &payload.student_id,
            started_at: now,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create attempt"))?;

    // Whether this insert or a concurrent one won, the unique pair row exists.
    let attempt = repositories::attempts::find_by_quiz_and_student(
        state.db(),
        &payload.quiz_id,
        &payload.student_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
    .ok_or_else(|| ApiError::Internal("Attempt vanished after insert".to_string()))?;

    if created {
        tracing::info!(
            attempt_id = %attempt.id,
            quiz_id = %attempt.quiz_id,
            student_id = %attempt.student_id,
            "Quiz attempt started"
        );
        metrics::counter!("attempts_started_total").increment(1);
        return Ok((StatusCode::CREATED, Json(attempt.into())));
    }

    let attempt = enforce_deadline(&state, attempt, quiz.duration_minutes).await?;
    if attempt.status == AttemptStatus::Submitted {
        return Err(ApiError::Conflict("Quiz already attempted".to_string()));
    }
    Ok((StatusCode::OK, Json(attempt.into())))
}

async fn save_answers(
    Path(attempt_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<AttemptAnswers>,
) -> Result<Json<AttemptResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let limits = state.settings().attempts();
    let allowed = state
        .redis()
        .rate_limit(
            &format!("rate-limit:answers:{attempt_id}"),
            limits.answer_save_rate_limit,
            limits.answer_save_rate_window_seconds,
        )
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Answer saves are rate limited"));
    }

    let attempt = repositories::attempts::find_by_id(state.db(), &attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .ok_or_else(|| ApiError::NotFound("Attempt not found".to_string()))?;

    if attempt.student_id != payload.student_id {
        return Err(ApiError::NotFound("Attempt not found".to_string()));
    }

    let quiz = repositories::quizzes::find_by_id(state.db(), &attempt.quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    // An expired attempt is auto-submitted here, then the write is rejected.
    let attempt = enforce_deadline(&state, attempt, quiz.duration_minutes).await?;
    if attempt.status == AttemptStatus::Submitted {
        return Err(ApiError::Conflict("Attempt is already submitted".to_string()));
    }

    let updated = repositories::attempts::merge_answers(
        state.db(),
        &attempt.id,
        &payload.student_answers,
        state.clock().now_primitive(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save answers"))?;

    match updated {
        Some(attempt) => Ok(Json(attempt.into())),
        // The auto-submit sweep slipped in between the check and the write.
        None => Err(ApiError::Conflict("Attempt is already submitted".to_string())),
    }
}

async fn submit_attempt(
    State(state): State<AppState>,
    Json(payload): Json<AttemptSubmit>,
) -> Result<Json<AttemptResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let attempt = repositories::attempts::find_by_id(state.db(), &payload.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .ok_or_else(|| ApiError::NotFound("Attempt not found".to_string()))?;

    if attempt.student_id != payload.student_id {
        return Err(ApiError::NotFound("Attempt not found".to_string()));
    }

    let quiz = repositories::quizzes::find_by_id(state.db(), &attempt.quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    let attempt = enforce_deadline(&state, attempt, quiz.duration_minutes).await?;
    if attempt.status == AttemptStatus::Submitted {
        return Err(ApiError::Conflict("Quiz already submitted".to_string()));
    }

    // Final answers are the stored map with the submitted ones merged on top.
    let mut answers = attempt.answers.0.clone();
    answers.extend(payload.student_answers);

    let now = state.clock().now_primitive();
    let finalized =
        attempt_finalize::finalize(state.db(), &attempt, &answers, now, now, FinalizeMode::Manual)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to submit attempt"))?;

    match finalized {
        Some(attempt) => Ok(Json(attempt.into())),
        None => Err(ApiError::Conflict("Quiz already submitted".to_string())),
    }
}

async fn time_remaining(
    Path((quiz_id, student_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<TimeRemainingResponse>, ApiError> {
    let attempt =
        repositories::attempts::find_by_quiz_and_student(state.db(), &quiz_id, &student_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
            .ok_or_else(|| ApiError::NotFound("No attempt for this quiz".to_string()))?;

    let quiz = repositories::quizzes::find_by_id(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    let attempt = enforce_deadline(&state, attempt, quiz.duration_minutes).await?;
    if attempt.status == AttemptStatus::Submitted {
        return Ok(Json(TimeRemainingResponse { time_remaining: 0 }));
    }

    let remaining = attempt_timing::remaining_minutes(
        attempt.started_at,
        quiz.duration_minutes,
        state.clock().now_primitive(),
    );

    Ok(Json(TimeRemainingResponse { time_remaining: remaining }))
}

async fn latest_attempt(
    Path((quiz_id, student_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<AttemptResponse>, ApiError> {
    let attempt =
        repositories::attempts::find_by_quiz_and_student(state.db(), &quiz_id, &student_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
            .ok_or_else(|| ApiError::NotFound("No attempt for this quiz".to_string()))?;

    let quiz = repositories::quizzes::find_by_id(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    let attempt = enforce_deadline(&state, attempt, quiz.duration_minutes).await?;

    Ok(Json(attempt.into()))
}

async fn list_quiz_attempts(
    Path(quiz_id): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<AttemptResponse>>, ApiError> {
    let items = repositories::attempts::list_by_quiz(state.db(), &quiz_id, query.skip, query.limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attempts"))?;
    let total_count = repositories::attempts::count_by_quiz(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;

    Ok(Json(PaginatedResponse {
        items: items.into_iter().map(AttemptResponse::from).collect(),
        total_count,
        skip: query.skip,
        limit: query.limit,
    }))
}

#[cfg(test)]
mod tests;
