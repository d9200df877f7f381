use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{QuestionOption, Quiz, QuizQuestion};
use crate::db::types::{QuestionType, QuizStatus};
use crate::repositories::quizzes::QuizSummaryRow;
use crate::schemas::{
    deserialize_offset_datetime_flexible, deserialize_option_offset_datetime_flexible,
};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OptionCreate {
    #[validate(length(min = 1, message = "option text must not be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    #[serde(alias = "isCorrect")]
    pub(crate) is_correct: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(alias = "questionType")]
    pub(crate) question_type: QuestionType,
    #[validate(length(min = 1, message = "question text must not be empty"))]
    pub(crate) text: String,
    #[validate(range(min = 1, message = "points must be positive"))]
    pub(crate) points: i32,
    #[serde(default)]
    #[serde(alias = "correctAnswer")]
    pub(crate) correct_answer: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) options: Vec<OptionCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizCreate {
    #[serde(alias = "courseId")]
    #[validate(length(min = 1, message = "course_id must not be empty"))]
    pub(crate) course_id: String,
    #[serde(alias = "instructorId")]
    #[validate(length(min = 1, message = "instructor_id must not be empty"))]
    pub(crate) instructor_id: String,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(alias = "startTime", deserialize_with = "deserialize_offset_datetime_flexible")]
    pub(crate) start_time: OffsetDateTime,
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: i32,
    #[serde(default = "default_status")]
    pub(crate) status: QuizStatus,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) questions: Vec<QuestionCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(
        default,
        alias = "startTime",
        deserialize_with = "deserialize_option_offset_datetime_flexible"
    )]
    pub(crate) start_time: Option<OffsetDateTime>,
    #[serde(default)]
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default)]
    pub(crate) status: Option<QuizStatus>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OptionResponse {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) question_type: QuestionType,
    pub(crate) text: String,
    pub(crate) points: i32,
    pub(crate) correct_answer: Option<String>,
    pub(crate) order_index: i32,
    pub(crate) options: Vec<OptionResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) instructor_id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) start_time: String,
    pub(crate) duration_minutes: i32,
    pub(crate) status: QuizStatus,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    pub(crate) questions: Vec<QuestionResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizSummaryResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) name: String,
    pub(crate) start_time: String,
    pub(crate) duration_minutes: i32,
    pub(crate) status: QuizStatus,
    pub(crate) question_count: i64,
    pub(crate) total_points: i64,
}

fn default_status() -> QuizStatus {
    QuizStatus::Draft
}

pub(crate) fn quiz_to_response(
    quiz: Quiz,
    questions: Vec<QuizQuestion>,
    options: Vec<QuestionOption>,
) -> QuizResponse {
    let questions = questions
        .into_iter()
        .map(|question| {
            let options = options
                .iter()
                .filter(|option| option.question_id == question.id)
                .map(|option| OptionResponse {
                    id: option.id.clone(),
                    text: option.text.clone(),
                    is_correct: option.is_correct,
                    order_index: option.order_index,
                })
                .collect();
            QuestionResponse {
                id: question.id,
                question_type: question.question_type,
                text: question.text,
                points: question.points,
                correct_answer: question.correct_answer,
                order_index: question.order_index,
                options,
            }
        })
        .collect();

    QuizResponse {
        id: quiz.id,
        course_id: quiz.course_id,
        instructor_id: quiz.instructor_id,
        name: quiz.name,
        description: quiz.description,
        start_time: format_primitive(quiz.start_time),
        duration_minutes: quiz.duration_minutes,
        status: quiz.status,
        created_at: format_primitive(quiz.created_at),
        updated_at: format_primitive(quiz.updated_at),
        questions,
    }
}

impl From<QuizSummaryRow> for QuizSummaryResponse {
    fn from(row: QuizSummaryRow) -> Self {
        Self {
            id: row.id,
            course_id: row.course_id,
            name: row.name,
            start_time: format_primitive(row.start_time),
            duration_minutes: row.duration_minutes,
            status: row.status,
            question_count: row.question_count,
            total_points: row.total_points,
        }
    }
}
