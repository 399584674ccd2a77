use crate::models::exercise::Answer;
use serde::{Deserialize, Serialize};

/// One user's live submission for one quiz. Each resubmission overwrites it
/// and bumps `attempts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub attempts: u32,
    pub answers: Vec<Answer>,
}
