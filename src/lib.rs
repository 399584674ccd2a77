pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use crate::config::Config;
use crate::database::{pool::create_store, SharedStore};
use crate::services::{
    ai_service::AIService, attempt_service::AttemptService,
    lecture_quiz_service::LectureQuizService, quiz_service::QuizService,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub jwt_secret: Arc<str>,
    pub lecture_quiz_service: LectureQuizService,
    pub quiz_service: QuizService,
    pub attempt_service: AttemptService,
    pub ai_service: AIService,
}

impl AppState {
    pub fn new(store: SharedStore, ai_service: AIService, jwt_secret: &str) -> Self {
        let lecture_quiz_service = LectureQuizService::new(store.clone());
        let quiz_service = QuizService::new(store.clone());
        let attempt_service = AttemptService::new(store.clone());

        Self {
            store,
            jwt_secret: Arc::from(jwt_secret),
            lecture_quiz_service,
            quiz_service,
            attempt_service,
            ai_service,
        }
    }

    pub async fn from_config(config: &Config) -> error::Result<Self> {
        let store = create_store(config).await?;
        let ai_service = AIService::openai(
            config.openai_api_key.clone(),
            config.openai_model.clone(),
            config.max_ai_exercises,
        )?;
        Ok(Self::new(store, ai_service, &config.jwt_secret))
    }
}
