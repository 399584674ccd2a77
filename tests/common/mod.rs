#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use classroom_quiz_backend::database::{memory::MemoryStore, DocumentStore, Precondition, SharedStore};
use classroom_quiz_backend::error::Result;
use classroom_quiz_backend::middleware::auth::issue_token;
use classroom_quiz_backend::services::ai_service::{AIService, CompletionClient};
use classroom_quiz_backend::{routes, AppState};
use mockall::mock;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test_secret_key";
pub const COURSE: &str = "c1";
pub const LECTURE: &str = "l1";
pub const PROFESSOR: &str = "prof-1";

mock! {
    pub Completion {}

    #[async_trait]
    impl CompletionClient for Completion {
        async fn complete(&self, task: &str, content: &str) -> Result<String>;
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: SharedStore,
    pub router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_completion(MockCompletion::new()).await
    }

    /// Course `c1` taught by `prof-1`, with an idle lecture `l1`.
    pub async fn with_completion(completion: MockCompletion) -> Self {
        let store: SharedStore = Arc::new(MemoryStore::new());
        store
            .put(
                "courses/c1",
                json!({ "name": "Biology", "professors": [PROFESSOR] }),
                Precondition::None,
            )
            .await
            .expect("seed course");
        store
            .put("courses/c1/lectures/l1", json!({ "event": null }), Precondition::None)
            .await
            .expect("seed lecture");

        let ai_service = AIService::new(Arc::new(completion), 10);
        let state = AppState::new(store.clone(), ai_service, JWT_SECRET);
        let router = routes::api_router(state.clone());
        Self {
            state,
            store,
            router,
        }
    }

    pub async fn call(&self, method: &str, uri: &str, user: Option<&str>, body: Option<JsonValue>) -> (StatusCode, JsonValue) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            let token = issue_token(JWT_SECRET, user, None, 3600).expect("token");
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let res = self.router.clone().oneshot(request).await.expect("response");
        let status = res.status();
        let bytes = to_bytes(res.into_body(), 1024 * 1024).await.expect("body");
        let json = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }
}

pub fn mcq_exercise() -> JsonValue {
    json!({
        "type": "MCQ",
        "question": "Which organelles carry their own DNA?",
        "propositions": [
            { "id": 0, "description": "Mitochondria" },
            { "id": 1, "description": "Ribosomes" },
            { "id": 2, "description": "Chloroplasts" },
            { "id": 3, "description": "Golgi apparatus" }
        ],
        "answersIndices": [0, 2],
        "numberOfAnswers": 2
    })
}

pub fn tf_exercise() -> JsonValue {
    json!({ "type": "TF", "question": "Plants respire at night.", "answer": true })
}

pub fn mcq_answer(indices: &[i32]) -> JsonValue {
    json!({ "type": "MCQAnswersIndices", "value": indices })
}

pub fn tf_answer(value: Option<bool>) -> JsonValue {
    json!({ "type": "TFAnswer", "value": value })
}
