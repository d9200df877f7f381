use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{AttemptStatus, QuestionType, QuizStatus, SubmissionState};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Quiz {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) instructor_id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) duration_minutes: i32,
    pub(crate) status: QuizStatus,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuizQuestion {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) question_type: QuestionType,
    pub(crate) text: String,
    pub(crate) points: i32,
    pub(crate) correct_answer: Option<String>,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuestionOption {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) text: String,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuizAttempt {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) student_id: String,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) submitted_at: Option<PrimitiveDateTime>,
    pub(crate) status: AttemptStatus,
    pub(crate) answers: Json<HashMap<String, String>>,
    pub(crate) points_earned: Option<i32>,
    pub(crate) total_points: Option<i32>,
    pub(crate) percentage: Option<f64>,
    pub(crate) letter_grade: Option<String>,
    pub(crate) performance_description: Option<String>,
    pub(crate) auto_submitted: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Assignment {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) instructor_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) due_date: PrimitiveDateTime,
    pub(crate) total_points: f64,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AssignmentSubmission {
    pub(crate) id: String,
    pub(crate) assignment_id: String,
    pub(crate) student_id: String,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) submission_number: i32,
    pub(crate) is_late: bool,
    pub(crate) status: SubmissionState,
    pub(crate) points_earned: Option<f64>,
    pub(crate) grade: Option<f64>,
    pub(crate) letter_grade: Option<String>,
    pub(crate) feedback: Option<String>,
    pub(crate) graded_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseGradeWeights {
    pub(crate) course_id: String,
    pub(crate) assignment_weight: f64,
    pub(crate) quiz_weight: f64,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseGrade {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) student_id: String,
    pub(crate) assignment_points_earned: f64,
    pub(crate) assignment_total_points: f64,
    pub(crate) quiz_points_earned: f64,
    pub(crate) quiz_total_points: f64,
    pub(crate) assignment_percentage: f64,
    pub(crate) quiz_percentage: f64,
    pub(crate) assignment_weight: f64,
    pub(crate) quiz_weight: f64,
    pub(crate) final_percentage: f64,
    pub(crate) letter_grade: Option<String>,
    pub(crate) grade_point: Option<f64>,
    pub(crate) performance_description: Option<String>,
    pub(crate) calculated_at: PrimitiveDateTime,
}
