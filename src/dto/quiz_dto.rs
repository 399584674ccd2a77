use crate::models::exercise::{Answer, Exercise};
use crate::models::quiz::Quiz;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1))]
    pub exercises: Vec<Exercise>,
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub show_result_to_students: bool,
}

impl From<CreateQuizPayload> for Quiz {
    fn from(payload: CreateQuizPayload) -> Self {
        Quiz {
            name: payload.name,
            exercises: payload.exercises,
            answers: payload.answers,
            ended: false,
            show_result_to_students: payload.show_result_to_students,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateQuizResponse {
    pub id: String,
    pub quiz: Quiz,
}
