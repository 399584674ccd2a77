mod common;

use axum::http::StatusCode;
use classroom_quiz_backend::error::Error;
use common::*;
use serde_json::json;

const COMPLETION: &str = "\
Where does photosynthesis happen?
<END_QUESTION>
<CORRECT_PROPOSITION> In chloroplasts <END_PROPOSITION>
<INCORRECT_PROPOSITION> In the nucleus <END_PROPOSITION>
<INCORRECT_PROPOSITION> In ribosomes <END_PROPOSITION>
<END_EXERCISE>
Which gas is released?
<END_QUESTION>
<CORRECT_PROPOSITION> Oxygen <END_PROPOSITION>
<END_EXERCISE>
";

#[tokio::test]
async fn generated_quiz_keeps_valid_exercises_and_reports_the_rest() {
    let mut completion = MockCompletion::new();
    completion
        .expect_complete()
        .withf(|task, content| task.contains("<END_EXERCISE>") && content.contains("chlorophyll"))
        .times(1)
        .returning(|_, _| Ok(COMPLETION.to_string()));
    let app = TestApp::with_completion(completion).await;

    let (status, body) = app
        .call(
            "POST",
            "/api/courses/c1/generate/quiz",
            Some(PROFESSOR),
            Some(json!({ "content": "Leaves are green because of chlorophyll." })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let exercises = body["exercises"].as_array().unwrap();
    assert_eq!(exercises.len(), 1);
    assert_eq!(exercises[0]["type"], "MCQ");
    assert_eq!(exercises[0]["question"], "Where does photosynthesis happen?");
    assert_eq!(exercises[0]["answersIndices"], json!([0]));
    assert_eq!(exercises[0]["numberOfAnswers"], 1);
    assert_eq!(body["answers"], json!([mcq_answer(&[0])]));
    assert_eq!(body["warnings"][0]["kind"], "too_few_propositions");
}

#[tokio::test]
async fn flashcards_come_back_in_order() {
    let mut completion = MockCompletion::new();
    completion.expect_complete().returning(|_, _| {
        Ok("What is ATP?<END_QUESTION>The energy currency of the cell.<END_ANSWER>\
            What is a stoma?<END_QUESTION>A leaf pore.<END_ANSWER>"
            .to_string())
    });
    let app = TestApp::with_completion(completion).await;

    let (status, body) = app
        .call(
            "POST",
            "/api/courses/c1/generate/flashcards",
            Some(PROFESSOR),
            Some(json!({ "content": "Cell energy and leaf anatomy." })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["cards"][0]["question"], "What is ATP?");
    assert_eq!(body["cards"][1]["answer"], "A leaf pore.");
    assert!(body["warnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unusable_completions_map_to_stable_labels() {
    let mut completion = MockCompletion::new();
    completion
        .expect_complete()
        .returning(|_, _| Ok("I cannot help with that.".to_string()));
    let app = TestApp::with_completion(completion).await;

    let (status, body) = app
        .call(
            "POST",
            "/api/courses/c1/generate/quiz",
            Some(PROFESSOR),
            Some(json!({ "content": "Mitosis." })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "no-exercise-generated");

    let (status, body) = app
        .call(
            "POST",
            "/api/courses/c1/generate/flashcards",
            Some(PROFESSOR),
            Some(json!({ "content": "Mitosis." })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "no-card-generated");
}

#[tokio::test]
async fn completion_outage_is_a_prompt_error() {
    let mut completion = MockCompletion::new();
    completion
        .expect_complete()
        .returning(|_, _| Err(Error::Internal("upstream timed out".to_string())));
    let app = TestApp::with_completion(completion).await;

    let (status, body) = app
        .call(
            "POST",
            "/api/courses/c1/generate/quiz",
            Some(PROFESSOR),
            Some(json!({ "content": "Meiosis." })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "error-prompt-ai");
}

#[tokio::test]
async fn only_professors_may_generate() {
    let mut completion = MockCompletion::new();
    completion.expect_complete().never();
    let app = TestApp::with_completion(completion).await;

    let (status, body) = app
        .call(
            "POST",
            "/api/courses/c1/generate/quiz",
            Some("student-1"),
            Some(json!({ "content": "Anything." })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "not_authorized");

    let (status, body) = app
        .call("POST", "/api/courses/c1/generate/quiz", Some(PROFESSOR), Some(json!({ "content": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn health_reports_the_store_backend() {
    let app = TestApp::new().await;
    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
}
