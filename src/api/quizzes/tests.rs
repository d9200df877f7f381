use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

const COURSE: &str = "course-1";

fn quiz_payload() -> serde_json::Value {
    json!({
        "course_id": COURSE,
        "instructor_id": "instructor-1",
        "name": "Stoichiometry check",
        "description": "Weekly quiz",
        "start_time": "2025-03-01T11:50:00Z",
        "duration_minutes": 60,
        "status": "draft",
        "questions": [
            {
                "question_type": "multiple_choice",
                "text": "Pick the capital",
                "points": 5,
                "options": [
                    {"text": "Paris", "is_correct": true},
                    {"text": "Lyon", "is_correct": false}
                ]
            },
            {
                "questionType": "true_false",
                "text": "Water boils at 100C at sea level",
                "points": 3,
                "correctAnswer": "true"
            },
            {
                "question_type": "short_answer",
                "text": "What is 6 * 7?",
                "points": 2,
                "correct_answer": "42"
            }
        ]
    })
}

#[tokio::test]
async fn create_activate_list_and_delete_quiz() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes",
            Some(quiz_payload()),
        ))
        .await
        .expect("create quiz");
    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    let quiz_id = created["id"].as_str().expect("quiz id").to_string();
    assert_eq!(created["status"], "draft");
    let questions = created["questions"].as_array().expect("questions");
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0]["order_index"], 0);
    assert_eq!(questions[0]["options"].as_array().unwrap().len(), 2);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/quizzes/{quiz_id}"),
            Some(json!({"status": "active"})),
        ))
        .await
        .expect("activate quiz");
    assert_eq!(response.status(), StatusCode::OK);
    let activated = test_support::read_json(response).await;
    assert_eq!(activated["status"], "active");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/quizzes/course/{COURSE}?status=active"),
            None,
        ))
        .await
        .expect("list quizzes");
    assert_eq!(response.status(), StatusCode::OK);
    let list = test_support::read_json(response).await;
    assert_eq!(list["total_count"], 1);
    assert_eq!(list["items"][0]["id"], quiz_id.as_str());
    assert_eq!(list["items"][0]["question_count"], 3);
    assert_eq!(list["items"][0]["total_points"], 10);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/quizzes/{quiz_id}"),
            None,
        ))
        .await
        .expect("delete quiz");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/quizzes/{quiz_id}"),
            None,
        ))
        .await
        .expect("get deleted quiz");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_rejects_malformed_question_shapes() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let mut payload = quiz_payload();
    payload["questions"] = json!([{
        "question_type": "multiple_choice",
        "text": "No options",
        "points": 5,
        "options": []
    }]);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, "/api/v1/quizzes", Some(payload)))
        .await
        .expect("mc without options");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut payload = quiz_payload();
    payload["questions"] = json!([{
        "question_type": "multiple_choice",
        "text": "Two right answers",
        "points": 5,
        "options": [
            {"text": "A", "is_correct": true},
            {"text": "B", "is_correct": true}
        ]
    }]);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, "/api/v1/quizzes", Some(payload)))
        .await
        .expect("mc with two correct options");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut payload = quiz_payload();
    payload["questions"] = json!([{
        "question_type": "true_false",
        "text": "Maybe?",
        "points": 3,
        "correct_answer": "yes"
    }]);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, "/api/v1/quizzes", Some(payload)))
        .await
        .expect("tf with non-boolean answer");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut payload = quiz_payload();
    payload["questions"] = json!([{
        "question_type": "short_answer",
        "text": "Answerless",
        "points": 2
    }]);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, "/api/v1/quizzes", Some(payload)))
        .await
        .expect("sa without answer");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut payload = quiz_payload();
    payload["questions"][0]["points"] = json!(0);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, "/api/v1/quizzes", Some(payload)))
        .await
        .expect("zero-point question");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn activation_requires_questions_and_delete_requires_force_with_attempts() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let mut payload = quiz_payload();
    payload["questions"] = json!([]);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, "/api/v1/quizzes", Some(payload)))
        .await
        .expect("create empty quiz");
    assert_eq!(response.status(), StatusCode::CREATED);
    let empty = test_support::read_json(response).await;
    let empty_id = empty["id"].as_str().expect("quiz id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/quizzes/{empty_id}"),
            Some(json!({"status": "active"})),
        ))
        .await
        .expect("activate empty quiz");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes",
            Some(quiz_payload()),
        ))
        .await
        .expect("create quiz");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = test_support::read_json(response).await;
    let quiz_id = created["id"].as_str().expect("quiz id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/quizzes/{quiz_id}"),
            Some(json!({"status": "active"})),
        ))
        .await
        .expect("activate quiz");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quiz-attempts/start",
            Some(json!({"quiz_id": quiz_id, "student_id": "student-1"})),
        ))
        .await
        .expect("start attempt");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/quizzes/{quiz_id}"),
            None,
        ))
        .await
        .expect("delete with attempts");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/quizzes/{quiz_id}?force=true"),
            None,
        ))
        .await
        .expect("forced delete");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
