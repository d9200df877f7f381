use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::QuizAttempt;
use crate::db::types::AttemptStatus;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AttemptStart {
    #[serde(alias = "quizId")]
    #[validate(length(min = 1, message = "quiz_id must not be empty"))]
    pub(crate) quiz_id: String,
    #[serde(alias = "studentId")]
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub(crate) student_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AttemptAnswers {
    #[serde(alias = "studentId")]
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub(crate) student_id: String,
    #[serde(default)]
    #[serde(alias = "studentAnswers")]
    pub(crate) student_answers: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AttemptSubmit {
    #[validate(length(min = 1, message = "id must not be empty"))]
    pub(crate) id: String,
    #[serde(alias = "studentId")]
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub(crate) student_id: String,
    #[serde(default)]
    #[serde(alias = "studentAnswers")]
    pub(crate) student_answers: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) student_id: String,
    pub(crate) started_at: String,
    pub(crate) submitted_at: Option<String>,
    pub(crate) status: AttemptStatus,
    pub(crate) answers: HashMap<String, String>,
    pub(crate) points_earned: Option<i32>,
    pub(crate) total_points: Option<i32>,
    pub(crate) percentage: Option<f64>,
    pub(crate) letter_grade: Option<String>,
    pub(crate) performance_description: Option<String>,
    pub(crate) auto_submitted: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

/// Whole minutes; 0 once the attempt is submitted.
#[derive(Debug, Serialize)]
pub(crate) struct TimeRemainingResponse {
    pub(crate) time_remaining: i64,
}

impl From<QuizAttempt> for AttemptResponse {
    fn from(attempt: QuizAttempt) -> Self {
        Self {
            id: attempt.id,
            quiz_id: attempt.quiz_id,
            student_id: attempt.student_id,
            started_at: format_primitive(attempt.started_at),
            submitted_at: attempt.submitted_at.map(format_primitive),
            status: attempt.status,
            answers: attempt.answers.0,
            points_earned: attempt.points_earned,
            total_points: attempt.total_points,
            percentage: attempt.percentage,
            letter_grade: attempt.letter_grade,
            performance_description: attempt.performance_description,
            auto_submitted: attempt.auto_submitted,
            created_at: format_primitive(attempt.created_at),
            updated_at: format_primitive(attempt.updated_at),
        }
    }
}
