use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{CourseGrade, CourseGradeWeights};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct WeightsUpdate {
    #[serde(alias = "assignmentWeight")]
    #[validate(range(min = 0.0, max = 100.0, message = "assignment_weight must be 0..=100"))]
    pub(crate) assignment_weight: f64,
    #[serde(alias = "quizWeight")]
    #[validate(range(min = 0.0, max = 100.0, message = "quiz_weight must be 0..=100"))]
    pub(crate) quiz_weight: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct WeightsResponse {
    pub(crate) course_id: String,
    pub(crate) assignment_weight: f64,
    pub(crate) quiz_weight: f64,
    pub(crate) updated_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseGradeResponse {
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
    pub(crate) calculated_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GpaResponse {
    pub(crate) student_id: String,
    pub(crate) gpa: f64,
    pub(crate) courses_counted: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecalculateResponse {
    pub(crate) course_id: String,
    pub(crate) students_recalculated: usize,
}

impl From<CourseGradeWeights> for WeightsResponse {
    fn from(weights: CourseGradeWeights) -> Self {
        Self {
            course_id: weights.course_id,
            assignment_weight: weights.assignment_weight,
            quiz_weight: weights.quiz_weight,
            updated_at: format_primitive(weights.updated_at),
        }
    }
}

impl From<CourseGrade> for CourseGradeResponse {
    fn from(grade: CourseGrade) -> Self {
        Self {
            id: grade.id,
            course_id: grade.course_id,
            student_id: grade.student_id,
            assignment_points_earned: grade.assignment_points_earned,
            assignment_total_points: grade.assignment_total_points,
            quiz_points_earned: grade.quiz_points_earned,
            quiz_total_points: grade.quiz_total_points,
            assignment_percentage: grade.assignment_percentage,
            quiz_percentage: grade.quiz_percentage,
            assignment_weight: grade.assignment_weight,
            quiz_weight: grade.quiz_weight,
            final_percentage: grade.final_percentage,
            letter_grade: grade.letter_grade,
            grade_point: grade.grade_point,
            performance_description: grade.performance_description,
            calculated_at: format_primitive(grade.calculated_at),
        }
    }
}
