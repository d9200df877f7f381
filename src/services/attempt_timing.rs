use time::{Duration, PrimitiveDateTime};

/// Quiz-level availability window `[start, start + duration)`. Independent of
/// any individual attempt's timer: an attempt started just before the window
/// closes still runs its full duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QuizWindow {
    NotStarted,
    Open,
    Ended,
}

pub(crate) fn quiz_window(
    start_time: PrimitiveDateTime,
    duration_minutes: i32,
    now: PrimitiveDateTime,
) -> QuizWindow {
    if now < start_time {
        QuizWindow::NotStarted
    } else if now < start_time + Duration::minutes(duration_minutes as i64) {
        QuizWindow::Open
    } else {
        QuizWindow::Ended
    }
}

pub(crate) fn attempt_deadline(
    started_at: PrimitiveDateTime,
    duration_minutes: i32,
) -> PrimitiveDateTime {
    started_at + Duration::minutes(duration_minutes as i64)
}

pub(crate) fn remaining_seconds(
    started_at: PrimitiveDateTime,
    duration_minutes: i32,
    now: PrimitiveDateTime,
) -> i64 {
    let deadline = attempt_deadline(started_at, duration_minutes);
    (deadline - now).whole_seconds().max(0)
}

/// The REST time-remaining payload is expressed in whole minutes.
pub(crate) fn remaining_minutes(
    started_at: PrimitiveDateTime,
    duration_minutes: i32,
    now: PrimitiveDateTime,
) -> i64 {
    remaining_seconds(started_at, duration_minutes, now) / 60
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn remaining_counts_down_and_clamps_at_zero() {
        let started = datetime!(2025-03-01 10:00:00);

        assert_eq!(remaining_seconds(started, 30, datetime!(2025-03-01 10:01:00)), 29 * 60);
        assert_eq!(remaining_minutes(started, 30, datetime!(2025-03-01 10:01:00)), 29);
        assert_eq!(remaining_seconds(started, 30, datetime!(2025-03-01 10:31:00)), 0);
        assert_eq!(remaining_minutes(started, 30, datetime!(2025-03-01 10:31:00)), 0);
    }

    #[test]
    fn remaining_minutes_floors_partial_minutes() {
        let started = datetime!(2025-03-01 10:00:00);

        assert_eq!(remaining_seconds(started, 30, datetime!(2025-03-01 10:00:30)), 29 * 60 + 30);
        assert_eq!(remaining_minutes(started, 30, datetime!(2025-03-01 10:00:30)), 29);
    }

    #[test]
    fn deadline_is_start_plus_duration() {
        let started = datetime!(2025-03-01 10:00:00);
        assert_eq!(attempt_deadline(started, 45), datetime!(2025-03-01 10:45:00));
    }

    #[test]
    fn window_boundaries() {
        let start = datetime!(2025-03-01 10:00:00);

        assert_eq!(quiz_window(start, 60, datetime!(2025-03-01 09:59:59)), QuizWindow::NotStarted);
        assert_eq!(quiz_window(start, 60, datetime!(2025-03-01 10:00:00)), QuizWindow::Open);
        assert_eq!(quiz_window(start, 60, datetime!(2025-03-01 10:59:59)), QuizWindow::Open);
        assert_eq!(quiz_window(start, 60, datetime!(2025-03-01 11:00:00)), QuizWindow::Ended);
    }

    #[test]
    fn attempt_timer_outlives_quiz_window() {
        let quiz_start = datetime!(2025-03-01 10:00:00);
        // Attempt started one minute before the window closes.
        let attempt_start = datetime!(2025-03-01 10:59:00);
        let after_window = datetime!(2025-03-01 11:30:00);

        assert_eq!(quiz_window(quiz_start, 60, after_window), QuizWindow::Ended);
        assert_eq!(remaining_minutes(attempt_start, 60, after_window), 29);
    }
}
