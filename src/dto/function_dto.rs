use crate::error::Result;
use crate::models::exercise::Answer;
use crate::models::quiz_attempt::QuizAttempt;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizAttemptArgs {
    pub quiz_attempt: QuizAttempt,
    #[validate(length(min = 1))]
    pub course_id: String,
    #[validate(length(min = 1))]
    pub quiz_id: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLectureQuizAttemptArgs {
    #[validate(length(min = 1))]
    pub course_id: String,
    #[validate(length(min = 1))]
    pub lecture_id: String,
    #[validate(length(min = 1))]
    pub lecture_event_id: String,
    pub lecture_quiz_attempt: Answer,
}

/// Cloud-function reply: `{status: 1, data}` or `{status: 0, error}`.
#[derive(Debug, Clone, Serialize)]
pub struct CallResponse<T> {
    pub status: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> CallResponse<T> {
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self {
                status: 1,
                data: Some(data),
                error: None,
            },
            Err(e) => {
                tracing::warn!("Function call failed: {}", e);
                Self {
                    status: 0,
                    data: None,
                    error: Some(e.label().to_string()),
                }
            }
        }
    }
}
