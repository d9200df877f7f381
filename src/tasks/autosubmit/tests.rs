use axum::http::{Method, StatusCode};
use serde_json::json;
use time::macros::datetime;
use time::Duration;
use tower::ServiceExt;

use crate::db::types::{AttemptStatus, QuestionType, QuizStatus};
use crate::repositories;
use crate::test_support;

const STUDENT: &str = "student-1";

async fn start_attempt(ctx: &test_support::TestContext, quiz_id: &str) -> String {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/start",
            Some(json!({"quiz_id": quiz_id, "student_id": STUDENT})),
        ))
        .await
        .expect("start attempt");
    assert_eq!(response.status(), StatusCode::CREATED);
    let attempt = test_support::read_json(response).await;
    attempt["id"].as_str().expect("attempt id").to_string()
}

#[tokio::test]
async fn sweep_grades_and_backdates_only_expired_attempts() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    // Both attempts start at 12:00. The short quiz's timer runs out at
    // 13:00, the long one's at 14:00.
    let short = test_support::insert_quiz(
        ctx.state.db(),
        "course-1",
        QuizStatus::Active,
        datetime!(2025-03-01 11:50:00),
        60,
    )
    .await;
    let question = test_support::insert_question(
        ctx.state.db(),
        &short.id,
        QuestionType::ShortAnswer,
        4,
        Some("42"),
        0,
    )
    .await;

    let long = test_support::insert_quiz(
        ctx.state.db(),
        "course-1",
        QuizStatus::Active,
        datetime!(2025-03-01 11:50:00),
        120,
    )
    .await;
    test_support::insert_question(
        ctx.state.db(),
        &long.id,
        QuestionType::ShortAnswer,
        4,
        Some("42"),
        0,
    )
    .await;

    let short_attempt_id = start_attempt(&ctx, &short.id).await;
    let long_attempt_id = start_attempt(&ctx, &long.id).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/quiz-attempts/{short_attempt_id}"),
            Some(json!({"student_id": STUDENT, "student_answers": {(&question.id): "42"}})),
        ))
        .await
        .expect("save answers");
    assert_eq!(response.status(), StatusCode::OK);

    // 13:15: only the short attempt is past its deadline.
    ctx.clock.advance(Duration::minutes(75));

    super::close_expired_attempts(&ctx.state).await.expect("sweep");

    let closed = repositories::attempts::find_by_id(ctx.state.db(), &short_attempt_id)
        .await
        .expect("fetch short attempt")
        .expect("short attempt exists");
    assert_eq!(closed.status, AttemptStatus::Submitted);
    assert!(closed.auto_submitted);
    // Graded from the saved answers, backdated to the deadline.
    assert_eq!(closed.points_earned, Some(4));
    assert_eq!(closed.total_points, Some(4));
    assert_eq!(closed.submitted_at, Some(datetime!(2025-03-01 13:00:00)));

    let running = repositories::attempts::find_by_id(ctx.state.db(), &long_attempt_id)
        .await
        .expect("fetch long attempt")
        .expect("long attempt exists");
    assert_eq!(running.status, AttemptStatus::InProgress);
    assert_eq!(running.submitted_at, None);

    // A second pass finds nothing new and leaves the stored score alone.
    super::close_expired_attempts(&ctx.state).await.expect("second sweep");

    let unchanged = repositories::attempts::find_by_id(ctx.state.db(), &short_attempt_id)
        .await
        .expect("refetch short attempt")
        .expect("short attempt exists");
    assert_eq!(unchanged.points_earned, Some(4));
    assert_eq!(unchanged.submitted_at, Some(datetime!(2025-03-01 13:00:00)));
    assert_eq!(
        repositories::attempts::find_by_id(ctx.state.db(), &long_attempt_id)
            .await
            .expect("refetch long attempt")
            .expect("long attempt exists")
            .status,
        AttemptStatus::InProgress
    );
}
