use crate::models::exercise::{Answer, Exercise};
use crate::models::flashcard::Flashcard;
use crate::services::parser_service::ParseWarning;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GeneratePayload {
    #[validate(length(min = 1, max = 200000))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedQuizResponse {
    pub exercises: Vec<Exercise>,
    /// Key for each exercise, ready to be accepted into a quiz.
    pub answers: Vec<Answer>,
    pub warnings: Vec<ParseWarning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedFlashcardsResponse {
    pub cards: Vec<Flashcard>,
    pub warnings: Vec<ParseWarning>,
}
