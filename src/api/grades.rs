use axum::extract::{Path, State};
use axum::{
    routing::{get, post, put},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::grade::{
    CourseGradeResponse, GpaResponse, RecalculateResponse, WeightsResponse, WeightsUpdate,
};
use crate::services::course_grades;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/course/:course_id/student/:student_id", get(get_course_grade))
        .route("/course/:course_id/weights", put(put_weights))
        .route("/course/:course_id/recalculate", post(recalculate_course))
        .route("/student/:student_id/gpa", get(get_gpa))
}

/// Materializes on first read: when no stored grade exists yet the breakdown
/// is computed and persisted before being returned.
async fn get_course_grade(
    Path((course_id, student_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<CourseGradeResponse>, ApiError> {
    if let Some(grade) =
        repositories::grades::find_course_grade(state.db(), &course_id, &student_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch course grade"))?
    {
        return Ok(Json(grade.into()));
    }

    let (assignment_weight, quiz_weight) =
        course_grades::effective_weights(state.db(), state.settings(), &course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch grade weights"))?;

    let grade = course_grades::recalculate_for_student(
        state.db(),
        &course_id,
        &student_id,
        assignment_weight,
        quiz_weight,
        state.clock().now_primitive(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to calculate course grade"))?;

    Ok(Json(grade.into()))
}

async fn get_gpa(
    Path(student_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<GpaResponse>, ApiError> {
    let row = repositories::grades::student_gpa(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute GPA"))?;

    let gpa = row.gpa.map(|value| (value * 100.0).round() / 100.0).unwrap_or(0.0);

    Ok(Json(GpaResponse { student_id, gpa, courses_counted: row.courses_counted }))
}

async fn put_weights(
    Path(course_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<WeightsUpdate>,
) -> Result<Json<WeightsResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if (payload.assignment_weight + payload.quiz_weight - 100.0).abs() > f64::EPSILON {
        return Err(ApiError::BadRequest("Weights must sum to 100".to_string()));
    }

    let now = state.clock().now_primitive();
    let weights = repositories::grades::upsert_weights(
        state.db(),
        &course_id,
        payload.assignment_weight,
        payload.quiz_weight,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to store grade weights"))?;

    // Stored grades carry the weights they were computed with; refresh them.
    course_grades::recalculate_course(
        state.db(),
        &course_id,
        weights.assignment_weight,
        weights.quiz_weight,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to recalculate course grades"))?;

    Ok(Json(weights.into()))
}

async fn recalculate_course(
    Path(course_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RecalculateResponse>, ApiError> {
    let (assignment_weight, quiz_weight) =
        course_grades::effective_weights(state.db(), state.settings(), &course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch grade weights"))?;

    let students_recalculated = course_grades::recalculate_course(
        state.db(),
        &course_id,
        assignment_weight,
        quiz_weight,
        state.clock().now_primitive(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to recalculate course grades"))?;

    Ok(Json(RecalculateResponse { course_id, students_recalculated }))
}
