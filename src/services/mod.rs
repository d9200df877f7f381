pub(crate) mod attempt_finalize;
pub(crate) mod attempt_timing;
pub(crate) mod course_grades;
pub(crate) mod grade_scale;
pub(crate) mod points;
pub(crate) mod quiz_grading;
pub(crate) mod submission_status;
