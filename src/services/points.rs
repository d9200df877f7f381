use crate::services::grade_scale;

/// Round half away from zero to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percentage of a grade category. Empty categories contribute 0 rather than
/// dividing by zero.
pub(crate) fn category_percentage(points_earned: f64, total_points: f64) -> f64 {
    if total_points > 0.0 {
        round1(points_earned / total_points * 100.0)
    } else {
        0.0
    }
}

pub(crate) fn weighted_final_percentage(
    assignment_percentage: f64,
    quiz_percentage: f64,
    assignment_weight: f64,
    quiz_weight: f64,
) -> f64 {
    round1(
        assignment_percentage * assignment_weight / 100.0 + quiz_percentage * quiz_weight / 100.0,
    )
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CourseGradeBreakdown {
    pub(crate) assignment_points_earned: f64,
    pub(crate) assignment_total_points: f64,
    pub(crate) quiz_points_earned: f64,
    pub(crate) quiz_total_points: f64,
    pub(crate) assignment_percentage: f64,
    pub(crate) quiz_percentage: f64,
    pub(crate) assignment_weight: f64,
    pub(crate) quiz_weight: f64,
    pub(crate) final_percentage: f64,
    pub(crate) letter_grade: Option<&'static str>,
    pub(crate) grade_point: Option<f64>,
    pub(crate) performance_description: Option<&'static str>,
}

impl CourseGradeBreakdown {
    /// Assembles the derived course-grade record. With no graded points in
    /// either category the letter fields stay `None`; callers render "N/A"
    /// rather than "F".
    pub(crate) fn compute(
        assignment_points_earned: f64,
        assignment_total_points: f64,
        quiz_points_earned: f64,
        quiz_total_points: f64,
        assignment_weight: f64,
        quiz_weight: f64,
    ) -> Self {
        let assignment_percentage =
            category_percentage(assignment_points_earned, assignment_total_points);
        let quiz_percentage = category_percentage(quiz_points_earned, quiz_total_points);
        let final_percentage = weighted_final_percentage(
            assignment_percentage,
            quiz_percentage,
            assignment_weight,
            quiz_weight,
        );

        let has_data = assignment_total_points > 0.0 || quiz_total_points > 0.0;
        let (letter_grade, grade_point, performance_description) = if has_data {
            (
                Some(grade_scale::quiz_letter_grade(final_percentage)),
                Some(grade_scale::grade_point(final_percentage)),
                Some(grade_scale::performance_description(final_percentage)),
            )
        } else {
            (None, None, None)
        };

        Self {
            assignment_points_earned,
            assignment_total_points,
            quiz_points_earned,
            quiz_total_points,
            assignment_percentage,
            quiz_percentage,
            assignment_weight,
            quiz_weight,
            final_percentage,
            letter_grade,
            grade_point,
            performance_description,
        }
    }
}
