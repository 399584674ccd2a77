mod common;

use axum::http::StatusCode;
use classroom_quiz_backend::database::{get_as, DocumentStore};
use classroom_quiz_backend::error::Error;
use classroom_quiz_backend::models::exercise::Answer;
use classroom_quiz_backend::models::quiz_attempt::QuizAttempt;
use common::*;
use serde_json::{json, Value as JsonValue};
use tokio_test::assert_ok;

const CREATE_ATTEMPT: &str = "/api/functions/createQuizAttempt";

async fn create_quiz(app: &TestApp) -> String {
    let (status, body) = app
        .call(
            "POST",
            "/api/courses/c1/quizzes",
            Some(PROFESSOR),
            Some(json!({
                "name": "Cells",
                "exercises": [mcq_exercise(), tf_exercise()],
                "answers": [mcq_answer(&[2, 0]), tf_answer(Some(true))]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().expect("quiz id").to_string()
}

fn attempt_args(quiz_id: &str, answers: JsonValue) -> JsonValue {
    json!({
        "quizAttempt": { "attempts": 0, "answers": answers },
        "courseId": "c1",
        "quizId": quiz_id
    })
}

#[tokio::test]
async fn resubmissions_count_up_on_one_document() {
    let app = TestApp::new().await;
    let quiz_id = create_quiz(&app).await;

    for expected in 1..=3 {
        let (status, body) = app
            .call(
                "POST",
                CREATE_ATTEMPT,
                Some("student-1"),
                Some(attempt_args(&quiz_id, json!([mcq_answer(&[0]), tf_answer(Some(false))]))),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], 1, "{body}");
        assert_eq!(body["data"]["id"], "student-1");
        assert_eq!(body["data"]["attempts"], expected);
    }

    let stored: QuizAttempt = get_as(
        app.store.as_ref(),
        &format!("courses/c1/assignments/{quiz_id}/attempts/student-1"),
    )
    .await
    .unwrap();
    assert_eq!(stored.attempts, 3);
    assert_eq!(stored.answers.len(), 2);
}

#[tokio::test]
async fn failures_are_reported_in_the_body() {
    let app = TestApp::new().await;
    let quiz_id = create_quiz(&app).await;

    let (status, body) = app
        .call(
            "POST",
            CREATE_ATTEMPT,
            Some("student-1"),
            Some(attempt_args(&quiz_id, json!([mcq_answer(&[0])]))),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 0);
    assert_eq!(body["error"], "length_mismatch");
    assert!(body.get("data").is_none());

    let (_, body) = app
        .call(
            "POST",
            CREATE_ATTEMPT,
            Some("student-1"),
            Some(attempt_args("missing", json!([mcq_answer(&[0]), tf_answer(None)]))),
        )
        .await;
    assert_eq!(body["status"], 0);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn ended_quiz_refuses_attempts() {
    let app = TestApp::new().await;
    let quiz_id = create_quiz(&app).await;

    let (status, _) = app
        .call("POST", &format!("/api/courses/c1/quizzes/{quiz_id}/end"), Some(PROFESSOR), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .call(
            "POST",
            CREATE_ATTEMPT,
            Some("student-1"),
            Some(attempt_args(&quiz_id, json!([mcq_answer(&[0]), tf_answer(Some(true))]))),
        )
        .await;
    assert_eq!(body["status"], 0);
    assert_eq!(body["error"], "quiz_ended");
}

#[tokio::test]
async fn explicit_path_must_belong_to_the_caller() {
    let app = TestApp::new().await;
    let quiz_id = create_quiz(&app).await;
    let answers = json!([mcq_answer(&[0, 2]), tf_answer(Some(true))]);

    let mut args = attempt_args(&quiz_id, answers.clone());
    args["path"] = json!(format!("courses/c1/assignments/{quiz_id}/attempts/student-2"));
    let (_, body) = app.call("POST", CREATE_ATTEMPT, Some("student-1"), Some(args)).await;
    assert_eq!(body["status"], 0);
    assert_eq!(body["error"], "bad_request");

    let mut args = attempt_args(&quiz_id, answers);
    args["path"] = json!(format!("courses/c1/assignments/{quiz_id}/attempts/student-1"));
    let (_, body) = app.call("POST", CREATE_ATTEMPT, Some("student-1"), Some(args)).await;
    assert_eq!(body["status"], 1, "{body}");
    assert_eq!(body["data"]["attempts"], 1);
}

#[tokio::test]
async fn explicit_path_cannot_reach_another_quiz() {
    let app = TestApp::new().await;
    let open = create_quiz(&app).await;
    let ended = create_quiz(&app).await;
    let (status, _) = app
        .call("POST", &format!("/api/courses/c1/quizzes/{ended}/end"), Some(PROFESSOR), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let answers = json!([mcq_answer(&[0, 2]), tf_answer(Some(true))]);
    let foreign_paths = [
        format!("courses/c1/assignments/{ended}/attempts/student-1"),
        "courses/c1/lectures/l1/lectureEvents/ev1/attempts/student-1".to_string(),
        format!("courses/c1/assignments/{open}/attempts/student-1/attempts/student-1"),
    ];
    for path in foreign_paths {
        let mut args = attempt_args(&open, answers.clone());
        args["path"] = json!(path);
        let (_, body) = app.call("POST", CREATE_ATTEMPT, Some("student-1"), Some(args)).await;
        assert_eq!(body["status"], 0, "{path}: {body}");
        assert_eq!(body["error"], "bad_request");
        assert!(app.store.get(&path).await.unwrap().is_none(), "{path}");
    }

    let (_, body) = app
        .call(
            "POST",
            CREATE_ATTEMPT,
            Some("student-1"),
            Some(attempt_args(&ended, answers)),
        )
        .await;
    assert_eq!(body["error"], "quiz_ended");
    assert!(app
        .store
        .get(&format!("courses/c1/assignments/{ended}/attempts/student-1"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn concurrent_records_each_get_their_own_count() {
    let app = TestApp::new().await;
    let path = "courses/c1/assignments/q1/attempts/student-1";

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let service = app.state.attempt_service.clone();
            tokio::spawn(async move { service.record(path, vec![Answer::mcq([i])]).await })
        })
        .collect();

    let mut counts = Vec::new();
    for handle in handles {
        counts.push(handle.await.unwrap().expect("record").attempts);
    }
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 2, 3, 4]);

    let stored: QuizAttempt = get_as(app.store.as_ref(), path).await.unwrap();
    assert_eq!(stored.attempts, 4);
}

#[tokio::test]
async fn stale_submission_conflicts_instead_of_overwriting() {
    let app = TestApp::new().await;
    let service = &app.state.attempt_service;
    let path = "courses/c1/assignments/q1/attempts/student-1";

    let receipt = assert_ok!(service.submit(None, vec![Answer::tf(Some(true))], path).await);
    assert_eq!(receipt.attempts, 1);

    let read = service.load(path).await.unwrap().expect("stored attempt");
    assert_ok!(service.submit(Some(&read), vec![Answer::tf(Some(false))], path).await);

    let err = service
        .submit(Some(&read), vec![Answer::tf(None)], path)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "{err:?}");

    let err = service.submit(None, vec![Answer::tf(None)], path).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "{err:?}");

    let stored = service.load(path).await.unwrap().expect("stored attempt");
    assert_eq!(stored.attempt.attempts, 2);
    assert_eq!(stored.attempt.answers, vec![Answer::tf(Some(false))]);
}

#[tokio::test]
async fn lecture_attempts_need_a_live_quiz() {
    let app = TestApp::new().await;
    let (_, body) = app
        .call(
            "POST",
            "/api/courses/c1/lectures/l1/quizzes",
            Some(PROFESSOR),
            Some(json!({ "pageNumber": 2, "exercise": mcq_exercise(), "answer": mcq_answer(&[0, 2]) })),
        )
        .await;
    let event_id = body["id"].as_str().unwrap().to_string();
    let args = |answer: JsonValue| {
        json!({
            "courseId": "c1",
            "lectureId": "l1",
            "lectureEventId": event_id,
            "lectureQuizAttempt": answer
        })
    };

    let (_, body) = app
        .call("POST", "/api/functions/createLectureQuizAttempt", Some("s1"), Some(args(mcq_answer(&[0]))))
        .await;
    assert_eq!(body["status"], 0);
    assert_eq!(body["error"], "invalid_transition");

    app.state
        .lecture_quiz_service
        .select(COURSE, LECTURE, &event_id, PROFESSOR)
        .await
        .unwrap();

    let (_, body) = app
        .call("POST", "/api/functions/createLectureQuizAttempt", Some("s1"), Some(args(tf_answer(Some(true)))))
        .await;
    assert_eq!(body["status"], 0);
    assert_eq!(body["error"], "bad_request");

    let (_, body) = app
        .call("POST", "/api/functions/createLectureQuizAttempt", Some("s1"), Some(args(mcq_answer(&[0, 1, 2]))))
        .await;
    assert_eq!(body["error"], "bad_request");

    for expected in 1..=2 {
        let (_, body) = app
            .call("POST", "/api/functions/createLectureQuizAttempt", Some("s1"), Some(args(mcq_answer(&[2]))))
            .await;
        assert_eq!(body["status"], 1, "{body}");
        assert_eq!(body["data"]["attempts"], expected);
    }

    app.state
        .lecture_quiz_service
        .end(COURSE, LECTURE, &event_id, PROFESSOR)
        .await
        .unwrap();
    let (_, body) = app
        .call("POST", "/api/functions/createLectureQuizAttempt", Some("s1"), Some(args(mcq_answer(&[2]))))
        .await;
    assert_eq!(body["status"], 0);
    assert_eq!(body["error"], "quiz_ended");
}
