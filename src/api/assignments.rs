use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::pagination::{PageQuery, PaginatedResponse};
use crate::core::state::AppState;
use crate::core::time::to_primitive_utc;
use crate::repositories;
use crate::schemas::assignment::{AssignmentCreate, AssignmentResponse, AssignmentUpdate};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_assignment))
        .route("/:assignment_id", get(get_assignment).patch(update_assignment))
        .route("/course/:course_id", get(list_course_assignments))
}

async fn create_assignment(
    State(state): State<AppState>,
    Json(payload): Json<AssignmentCreate>,
) -> Result<(StatusCode, Json<AssignmentResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = state.clock().now_primitive();
    let assignment = repositories::assignments::create(
        state.db(),
        repositories::assignments::CreateAssignment {
            id: &Uuid::new_v4().to_string(),
            course_id: &payload.course_id,
            instructor_id: &payload.instructor_id,
            title: &payload.title,
            description: payload.description.as_deref(),
            due_date: to_primitive_utc(payload.due_date),
            total_points: payload.total_points,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create assignment"))?;

    Ok((StatusCode::CREATED, Json(assignment.into())))
}

async fn get_assignment(
    Path(assignment_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let assignment = repositories::assignments::find_by_id(state.db(), &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assignment"))?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))?;

    Ok(Json(assignment.into()))
}

async fn list_course_assignments(
    Path(course_id): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<AssignmentResponse>>, ApiError> {
    let items =
        repositories::assignments::list_by_course(state.db(), &course_id, query.skip, query.limit)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list assignments"))?;
    let total_count = repositories::assignments::count_by_course(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count assignments"))?;

    Ok(Json(PaginatedResponse {
        items: items.into_iter().map(AssignmentResponse::from).collect(),
        total_count,
        skip: query.skip,
        limit: query.limit,
    }))
}

/// Due-date edits only affect future submissions; existing ones keep their
/// frozen `is_late` and status.
async fn update_assignment(
    Path(assignment_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<AssignmentUpdate>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let assignment = repositories::assignments::update(
        state.db(),
        &assignment_id,
        repositories::assignments::UpdateAssignment {
            title: payload.title.as_deref(),
            description: payload.description.as_deref(),
            due_date: payload.due_date.map(to_primitive_utc),
            total_points: payload.total_points,
            updated_at: state.clock().now_primitive(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update assignment"))?
    .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))?;

    Ok(Json(assignment.into()))
}
