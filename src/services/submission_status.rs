use time::PrimitiveDateTime;

use crate::db::types::SubmissionState;

/// The late flag is computed once against the due date in force at submission
/// time and frozen; later due-date edits never reclassify a submission.
pub(crate) fn is_late(submitted_at: PrimitiveDateTime, due_date: PrimitiveDateTime) -> bool {
    submitted_at > due_date
}

pub(crate) fn initial_status(is_late: bool) -> SubmissionState {
    if is_late {
        SubmissionState::LateSubmitted
    } else {
        SubmissionState::Submitted
    }
}

/// Status only ever moves submitted -> graded within its late branch.
pub(crate) fn graded_status(is_late: bool) -> SubmissionState {
    if is_late {
        SubmissionState::LateGraded
    } else {
        SubmissionState::Graded
    }
}
