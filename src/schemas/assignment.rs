use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Assignment, AssignmentSubmission};
use crate::db::types::SubmissionState;
use crate::schemas::{
    deserialize_offset_datetime_flexible, deserialize_option_offset_datetime_flexible,
};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssignmentCreate {
    #[serde(alias = "courseId")]
    #[validate(length(min = 1, message = "course_id must not be empty"))]
    pub(crate) course_id: String,
    #[serde(alias = "instructorId")]
    #[validate(length(min = 1, message = "instructor_id must not be empty"))]
    pub(crate) instructor_id: String,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(alias = "dueDate", deserialize_with = "deserialize_offset_datetime_flexible")]
    pub(crate) due_date: OffsetDateTime,
    #[serde(alias = "totalPoints")]
    #[validate(range(exclusive_min = 0.0, message = "total_points must be positive"))]
    pub(crate) total_points: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssignmentUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(
        default,
        alias = "dueDate",
        deserialize_with = "deserialize_option_offset_datetime_flexible"
    )]
    pub(crate) due_date: Option<OffsetDateTime>,
    #[serde(default)]
    #[serde(alias = "totalPoints")]
    #[validate(range(exclusive_min = 0.0, message = "total_points must be positive"))]
    pub(crate) total_points: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubmissionCreate {
    #[serde(alias = "assignmentId")]
    #[validate(length(min = 1, message = "assignment_id must not be empty"))]
    pub(crate) assignment_id: String,
    #[serde(alias = "studentId")]
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub(crate) student_id: String,
}

/// Two accepted grading shapes: `points_earned` scores against the
/// assignment's total on the coarse scale; `grade` takes the percentage as
/// given and derives the letter on the fine scale unless one is supplied.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubmissionGrade {
    #[serde(default)]
    #[serde(alias = "pointsEarned")]
    #[validate(range(min = 0.0, message = "points_earned must be non-negative"))]
    pub(crate) points_earned: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "grade must be between 0 and 100"))]
    pub(crate) grade: Option<f64>,
    #[serde(default)]
    #[serde(alias = "letterGrade")]
    #[validate(length(min = 1, message = "letter_grade must not be empty"))]
    pub(crate) letter_grade: Option<String>,
    #[serde(default)]
    pub(crate) feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) instructor_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) due_date: String,
    pub(crate) total_points: f64,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) assignment_id: String,
    pub(crate) student_id: String,
    pub(crate) submitted_at: String,
    pub(crate) submission_number: i32,
    pub(crate) is_late: bool,
    pub(crate) status: SubmissionState,
    pub(crate) points_earned: Option<f64>,
    pub(crate) grade: Option<f64>,
    pub(crate) letter_grade: Option<String>,
    pub(crate) feedback: Option<String>,
    pub(crate) graded_at: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<Assignment> for AssignmentResponse {
    fn from(assignment: Assignment) -> Self {
        Self {
            id: assignment.id,
            course_id: assignment.course_id,
            instructor_id: assignment.instructor_id,
            title: assignment.title,
            description: assignment.description,
            due_date: format_primitive(assignment.due_date),
            total_points: assignment.total_points,
            created_at: format_primitive(assignment.created_at),
            updated_at: format_primitive(assignment.updated_at),
        }
    }
}

impl From<AssignmentSubmission> for SubmissionResponse {
    fn from(submission: AssignmentSubmission) -> Self {
        Self {
            id: submission.id,
            assignment_id: submission.assignment_id,
            student_id: submission.student_id,
            submitted_at: format_primitive(submission.submitted_at),
            submission_number: submission.submission_number,
            is_late: submission.is_late,
            status: submission.status,
            points_earned: submission.points_earned,
            grade: submission.grade,
            letter_grade: submission.letter_grade,
            feedback: submission.feedback,
            graded_at: submission.graded_at.map(format_primitive),
            created_at: format_primitive(submission.created_at),
            updated_at: format_primitive(submission.updated_at),
        }
    }
}
