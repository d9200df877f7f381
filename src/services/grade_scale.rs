//! Percentage-to-letter tables. Two assignment scales coexist on purpose:
//! the fine 13-band table is used when an instructor supplies a percentage
//! directly, the coarse 8-band table when a submission is graded from earned
//! points. They disagree (93% is A on one, A+ on the other) and are kept as
//! distinct named scales rather than reconciled.

/// Fine assignment scale. Lower bounds inclusive.
pub(crate) fn assignment_letter_grade(percentage: f64) -> &'static str {
    match percentage {
        p if p >= 93.0 => "A",
        p if p >= 90.0 => "A-",
        p if p >= 87.0 => "B+",
        p if p >= 83.0 => "B",
        p if p >= 80.0 => "B-",
        p if p >= 77.0 => "C+",
        p if p >= 73.0 => "C",
        p if p >= 70.0 => "C-",
        p if p >= 67.0 => "D+",
        p if p >= 63.0 => "D",
        p if p >= 60.0 => "D-",
        _ => "F",
    }
}

/// Coarse assignment scale used when grading from earned points.
pub(crate) fn assignment_points_letter_grade(percentage: f64) -> &'static str {
    coarse_letter_grade(percentage)
}

/// Quiz results use the coarse bands.
pub(crate) fn quiz_letter_grade(percentage: f64) -> &'static str {
    coarse_letter_grade(percentage)
}

pub(crate) fn performance_description(percentage: f64) -> &'static str {
    match percentage {
        p if p >= 90.0 => "Outstanding",
        p if p >= 80.0 => "Excellent",
        p if p >= 70.0 => "Very Good",
        p if p >= 60.0 => "Good",
        p if p >= 50.0 => "Satisfactory",
        p if p >= 40.0 => "Acceptable",
        p if p >= 35.0 => "Basic",
        _ => "Fail",
    }
}

/// 4.0-scale grade point on the coarse bands.
pub(crate) fn grade_point(percentage: f64) -> f64 {
    match percentage {
        p if p >= 90.0 => 4.0,
        p if p >= 80.0 => 3.75,
        p if p >= 70.0 => 3.5,
        p if p >= 60.0 => 3.0,
        p if p >= 50.0 => 2.5,
        p if p >= 40.0 => 2.0,
        p if p >= 35.0 => 1.5,
        _ => 0.0,
    }
}

fn coarse_letter_grade(percentage: f64) -> &'static str {
    match percentage {
        p if p >= 90.0 => "A+",
        p if p >= 80.0 => "A",
        p if p >= 70.0 => "B+",
        p if p >= 60.0 => "B",
        p if p >= 50.0 => "C+",
        p if p >= 40.0 => "C",
        p if p >= 35.0 => "D+",
        _ => "F",
    }
}
