use axum::http::{Method, StatusCode};
use serde_json::json;
use time::macros::datetime;
use time::Duration;
use tower::ServiceExt;

use crate::db::types::{QuestionType, QuizStatus};
use crate::test_support;

const COURSE: &str = "course-1";
const STUDENT: &str = "student-1";

struct SeededQuiz {
    quiz_id: String,
    mc_id: String,
    correct_option_id: String,
    tf_id: String,
    sa_id: String,
}

/// Active quiz whose window is open at the test epoch (12:00), worth
/// 5 + 3 + 2 points.
async fn seed_open_quiz(ctx: &test_support::TestContext) -> SeededQuiz {
    let quiz = test_support::insert_quiz(
        ctx.state.db(),
        COURSE,
        QuizStatus::Active,
        datetime!(2025-03-01 11:50:00),
        60,
    )
    .await;

    let mc = test_support::insert_question(
        ctx.state.db(),
        &quiz.id,
        QuestionType::MultipleChoice,
        5,
        None,
        0,
    )
    .await;
    let correct = test_support::insert_option(ctx.state.db(), &mc.id, "Paris", true, 0).await;
    test_support::insert_option(ctx.state.db(), &mc.id, "Lyon", false, 1).await;

    let tf = test_support::insert_question(
        ctx.state.db(),
        &quiz.id,
        QuestionType::TrueFalse,
        3,
        Some("true"),
        1,
    )
    .await;
    let sa = test_support::insert_question(
        ctx.state.db(),
        &quiz.id,
        QuestionType::ShortAnswer,
        2,
        Some("42"),
        2,
    )
    .await;

    SeededQuiz {
        quiz_id: quiz.id,
        mc_id: mc.id,
        correct_option_id: correct.id,
        tf_id: tf.id,
        sa_id: sa.id,
    }
}

#[tokio::test]
async fn start_resumes_and_submit_grades_strictly() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let seeded = seed_open_quiz(&ctx).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/start",
            Some(json!({"quiz_id": seeded.quiz_id, "student_id": STUDENT})),
        ))
        .await
        .expect("start");
    assert_eq!(response.status(), StatusCode::CREATED);
    let attempt = test_support::read_json(response).await;
    let attempt_id = attempt["id"].as_str().expect("attempt id").to_string();
    assert_eq!(attempt["status"], "in_progress");

    // Starting again resumes the same attempt instead of rejecting.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/start",
            Some(json!({"quiz_id": seeded.quiz_id, "student_id": STUDENT})),
        ))
        .await
        .expect("resume");
    assert_eq!(response.status(), StatusCode::OK);
    let resumed = test_support::read_json(response).await;
    assert_eq!(resumed["id"], attempt_id.as_str());
    assert_eq!(resumed["started_at"], attempt["started_at"]);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/quiz-attempts/{attempt_id}"),
            Some(json!({
                "student_id": STUDENT,
                "student_answers": {
                    (&seeded.mc_id): seeded.correct_option_id,
                    (&seeded.tf_id): "True"
                }
            })),
        ))
        .await
        .expect("save answers");
    assert_eq!(response.status(), StatusCode::OK);

    // "True" is wrong against a stored "true": comparison is case-sensitive.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/submit",
            Some(json!({
                "id": attempt_id,
                "student_id": STUDENT,
                "student_answers": {(&seeded.sa_id): "42"}
            })),
        ))
        .await
        .expect("submit");
    assert_eq!(response.status(), StatusCode::OK);
    let graded = test_support::read_json(response).await;
    assert_eq!(graded["status"], "submitted");
    assert_eq!(graded["points_earned"], 7);
    assert_eq!(graded["total_points"], 10);
    assert_eq!(graded["percentage"], 70.0);
    assert_eq!(graded["letter_grade"], "B+");
    assert_eq!(graded["performance_description"], "Very Good");
    assert_eq!(graded["auto_submitted"], false);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/submit",
            Some(json!({"id": attempt_id, "student_id": STUDENT, "student_answers": {}})),
        ))
        .await
        .expect("double submit");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Once submitted, starting again is a hard conflict.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/start",
            Some(json!({"quiz_id": seeded.quiz_id, "student_id": STUDENT})),
        ))
        .await
        .expect("restart after submit");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/quiz-attempts/quiz/{}", seeded.quiz_id),
            None,
        ))
        .await
        .expect("list");
    assert_eq!(response.status(), StatusCode::OK);
    let list = test_support::read_json(response).await;
    assert_eq!(list["total_count"], 1);
    assert_eq!(list["items"][0]["id"], attempt_id.as_str());
}

#[tokio::test]
async fn start_rejects_missing_inactive_and_out_of_window_quizzes() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/start",
            Some(json!({"quiz_id": "nope", "student_id": STUDENT})),
        ))
        .await
        .expect("missing quiz");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let draft = test_support::insert_quiz(
        ctx.state.db(),
        COURSE,
        QuizStatus::Draft,
        datetime!(2025-03-01 11:50:00),
        60,
    )
    .await;
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/start",
            Some(json!({"quiz_id": draft.id, "student_id": STUDENT})),
        ))
        .await
        .expect("draft quiz");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let future = test_support::insert_quiz(
        ctx.state.db(),
        COURSE,
        QuizStatus::Active,
        datetime!(2025-03-01 13:00:00),
        60,
    )
    .await;
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/start",
            Some(json!({"quiz_id": future.id, "student_id": STUDENT})),
        ))
        .await
        .expect("future quiz");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let ended = test_support::insert_quiz(
        ctx.state.db(),
        COURSE,
        QuizStatus::Active,
        datetime!(2025-03-01 10:00:00),
        60,
    )
    .await;
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/start",
            Some(json!({"quiz_id": ended.id, "student_id": STUDENT})),
        ))
        .await
        .expect("ended quiz");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn start_resumes_a_running_attempt_after_the_quiz_window_closes() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let seeded = seed_open_quiz(&ctx).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/start",
            Some(json!({"quiz_id": seeded.quiz_id, "student_id": STUDENT})),
        ))
        .await
        .expect("start");
    assert_eq!(response.status(), StatusCode::CREATED);
    let attempt = test_support::read_json(response).await;
    let attempt_id = attempt["id"].as_str().expect("attempt id").to_string();

    // 12:55: the quiz window (11:50 + 60) has closed, but the attempt's own
    // deadline (12:00 + 60) has not. A refresh must get the attempt back.
    ctx.clock.advance(Duration::minutes(55));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/start",
            Some(json!({"quiz_id": seeded.quiz_id, "student_id": STUDENT})),
        ))
        .await
        .expect("resume after window close");
    assert_eq!(response.status(), StatusCode::OK);
    let resumed = test_support::read_json(response).await;
    assert_eq!(resumed["id"], attempt_id.as_str());
    assert_eq!(resumed["status"], "in_progress");

    // A fresh student is still gated by the window.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/start",
            Some(json!({"quiz_id": seeded.quiz_id, "student_id": "student-2"})),
        ))
        .await
        .expect("new attempt after window close");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // 13:05: past the attempt deadline, starting again closes it and conflicts.
    ctx.clock.advance(Duration::minutes(10));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/start",
            Some(json!({"quiz_id": seeded.quiz_id, "student_id": STUDENT})),
        ))
        .await
        .expect("restart after expiry");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn expired_attempt_is_auto_submitted_and_backdated() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let seeded = seed_open_quiz(&ctx).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/start",
            Some(json!({"quiz_id": seeded.quiz_id, "student_id": STUDENT})),
        ))
        .await
        .expect("start");
    assert_eq!(response.status(), StatusCode::CREATED);
    let attempt = test_support::read_json(response).await;
    let attempt_id = attempt["id"].as_str().expect("attempt id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/quiz-attempts/{attempt_id}"),
            Some(json!({
                "student_id": STUDENT,
                "student_answers": {(&seeded.sa_id): "42"}
            })),
        ))
        .await
        .expect("save answers");
    assert_eq!(response.status(), StatusCode::OK);

    // Past the 60-minute attempt deadline (13:00).
    ctx.clock.advance(Duration::minutes(75));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!(
                "/api/v1/quiz-attempts/quiz/{}/time-remaining/{STUDENT}",
                seeded.quiz_id
            ),
            None,
        ))
        .await
        .expect("time remaining");
    assert_eq!(response.status(), StatusCode::OK);
    let remaining = test_support::read_json(response).await;
    assert_eq!(remaining["time_remaining"], 0);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/quiz-attempts/quiz/{}/student/{STUDENT}", seeded.quiz_id),
            None,
        ))
        .await
        .expect("latest attempt");
    assert_eq!(response.status(), StatusCode::OK);
    let closed = test_support::read_json(response).await;
    assert_eq!(closed["status"], "submitted");
    assert_eq!(closed["auto_submitted"], true);
    // Graded from the last recorded answers, backdated to the deadline.
    assert_eq!(closed["points_earned"], 2);
    assert_eq!(closed["submitted_at"], "2025-03-01T13:00:00Z");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/quiz-attempts/{attempt_id}"),
            Some(json!({"student_id": STUDENT, "student_answers": {"x": "y"}})),
        ))
        .await
        .expect("write after close");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn time_remaining_counts_down_in_whole_minutes() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let seeded = seed_open_quiz(&ctx).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!(
                "/api/v1/quiz-attempts/quiz/{}/time-remaining/{STUDENT}",
                seeded.quiz_id
            ),
            None,
        ))
        .await
        .expect("no attempt yet");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/start",
            Some(json!({"quiz_id": seeded.quiz_id, "student_id": STUDENT})),
        ))
        .await
        .expect("start");
    assert_eq!(response.status(), StatusCode::CREATED);

    ctx.clock.advance(Duration::seconds(90));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!(
                "/api/v1/quiz-attempts/quiz/{}/time-remaining/{STUDENT}",
                seeded.quiz_id
            ),
            None,
        ))
        .await
        .expect("time remaining");
    assert_eq!(response.status(), StatusCode::OK);
    let remaining = test_support::read_json(response).await;
    // 58.5 minutes left, floored.
    assert_eq!(remaining["time_remaining"], 58);
}
