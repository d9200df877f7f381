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
use crate::repositories;
use crate::schemas::assignment::{SubmissionCreate, SubmissionGrade, SubmissionResponse};
use crate::services::{grade_scale, points, submission_status};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_submission))
        .route("/:submission_id", get(get_submission))
        .route("/:submission_id/grade", put(grade_submission))
        .route("/assignment/:assignment_id", get(list_assignment_submissions))
        .route(
            "/assignment/:assignment_id/student/:student_id/latest",
            get(latest_submission),
        )
}

async fn create_submission(
    State(state): State<AppState>,
    Json(payload): Json<SubmissionCreate>,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let assignment = repositories::assignments::find_by_id(state.db(), &payload.assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assignment"))?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))?;

    let now = state.clock().now_primitive();
    // Lateness is decided against the due date in force right now and frozen.
    let is_late = submission_status::is_late(now, assignment.due_date);

    let submission = repositories::submissions::create(
        state.db(),
        repositories::submissions::CreateSubmission {
            id: &Uuid::new_v4().to_string(),
            assignment_id: &payload.assignment_id,
            student_id: &payload.student_id,
            submitted_at: now,
            is_late,
            status: submission_status::initial_status(is_late),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create submission"))?;

    tracing::info!(
        submission_id = %submission.id,
        assignment_id = %submission.assignment_id,
        submission_number = submission.submission_number,
        is_late,
        "Assignment submission recorded"
    );

    Ok((StatusCode::CREATED, Json(submission.into())))
}

async fn get_submission(
    Path(submission_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = repositories::submissions::find_by_id(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    Ok(Json(submission.into()))
}

/// 404 here is the documented "no submission yet" state, not an error.
async fn latest_submission(
    Path((assignment_id, student_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission =
        repositories::submissions::find_latest(state.db(), &assignment_id, &student_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
            .ok_or_else(|| ApiError::NotFound("No submission for this assignment".to_string()))?;

    Ok(Json(submission.into()))
}

async fn list_assignment_submissions(
    Path(assignment_id): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<SubmissionResponse>>, ApiError> {
    let items = repositories::submissions::list_by_assignment(
        state.db(),
        &assignment_id,
        query.skip,
        query.limit,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;
    let total_count = repositories::submissions::count_by_assignment(state.db(), &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count submissions"))?;

    Ok(Json(PaginatedResponse {
        items: items.into_iter().map(SubmissionResponse::from).collect(),
        total_count,
        skip: query.skip,
        limit: query.limit,
    }))
}

struct GradeFields {
    points_earned: Option<f64>,
    grade: f64,
    letter_grade: String,
}

/// Two grading shapes share the endpoint. The points path derives the
/// percentage from the assignment total and letters it on the coarse scale;
/// the faculty path takes the percentage as given and letters it on the fine
/// scale unless an explicit letter was supplied.
fn resolve_grade(
    payload: &SubmissionGrade,
    assignment_total_points: f64,
) -> Result<GradeFields, ApiError> {
    match (payload.points_earned, payload.grade) {
        (Some(_), Some(_)) => Err(ApiError::BadRequest(
            "Provide either points_earned or grade, not both".to_string(),
        )),
        (None, None) => {
            Err(ApiError::BadRequest("Provide points_earned or grade".to_string()))
        }
        (Some(points_earned), None) => {
            if points_earned > assignment_total_points {
                return Err(ApiError::BadRequest(format!(
                    "points_earned exceeds assignment total of {assignment_total_points}"
                )));
            }
            let percentage = points::category_percentage(points_earned, assignment_total_points);
            Ok(GradeFields {
                points_earned: Some(points_earned),
                grade: percentage,
                letter_grade: grade_scale::assignment_points_letter_grade(percentage).to_string(),
            })
        }
        (None, Some(grade)) => {
            let letter_grade = match &payload.letter_grade {
                Some(letter) => letter.clone(),
                None => grade_scale::assignment_letter_grade(grade).to_string(),
            };
            Ok(GradeFields { points_earned: None, grade, letter_grade })
        }
    }
}

async fn grade_submission(
    Path(submission_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<SubmissionGrade>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let submission = repositories::submissions::find_by_id(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    let assignment = repositories::assignments::find_by_id(state.db(), &submission.assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assignment"))?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))?;

    let fields = resolve_grade(&payload, assignment.total_points)?;

    let now = state.clock().now_primitive();
    let graded = repositories::submissions::grade(
        state.db(),
        repositories::submissions::GradeSubmission {
            id: &submission.id,
            // Regrading updates scores but never flips the late branch.
            status: submission_status::graded_status(submission.is_late),
            points_earned: fields.points_earned,
            grade: fields.grade,
            letter_grade: &fields.letter_grade,
            feedback: payload.feedback.as_deref(),
            graded_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to grade submission"))?
    .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    tracing::info!(
        submission_id = %graded.id,
        grade = fields.grade,
        letter_grade = %fields.letter_grade,
        "Assignment submission graded"
    );
    metrics::counter!("submissions_graded_total").increment(1);

    Ok(Json(graded.into()))
}
