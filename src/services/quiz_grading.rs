use std::collections::HashMap;

use crate::db::types::QuestionType;
use crate::services::grade_scale;
use crate::services::points::round1;

/// The grading-relevant slice of a question: for multiple choice the id of
/// the single correct option, for the other types the stored correct answer.
#[derive(Debug, Clone)]
pub(crate) struct QuestionKey {
    pub(crate) question_id: String,
    pub(crate) question_type: QuestionType,
    pub(crate) points: i32,
    pub(crate) correct_answer: Option<String>,
    pub(crate) correct_option_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AttemptGrade {
    pub(crate) points_earned: i32,
    pub(crate) total_points: i32,
    pub(crate) percentage: f64,
    pub(crate) letter_grade: &'static str,
    pub(crate) performance_description: &'static str,
}

/// Grades every question. Unanswered questions and unknown question ids score
/// zero; this never fails. Comparison is strict string equality for all
/// question types (no trimming or case folding).
pub(crate) fn grade_attempt(
    questions: &[QuestionKey],
    answers: &HashMap<String, String>,
) -> AttemptGrade {
    let mut points_earned = 0;
    let mut total_points = 0;

    for question in questions {
        total_points += question.points;

        let Some(answer) = answers.get(&question.question_id) else {
            continue;
        };

        if is_correct(question, answer) {
            points_earned += question.points;
        }
    }

    let percentage = if total_points > 0 {
        round1(points_earned as f64 / total_points as f64 * 100.0)
    } else {
        0.0
    };

    AttemptGrade {
        points_earned,
        total_points,
        percentage,
        letter_grade: grade_scale::quiz_letter_grade(percentage),
        performance_description: grade_scale::performance_description(percentage),
    }
}

fn is_correct(question: &QuestionKey, answer: &str) -> bool {
    match question.question_type {
        QuestionType::MultipleChoice => {
            question.correct_option_id.as_deref() == Some(answer)
        }
        QuestionType::TrueFalse | QuestionType::ShortAnswer => {
            question.correct_answer.as_deref() == Some(answer)
        }
    }
}
