use crate::models::exercise::{Answer, Exercise};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLectureQuizPayload {
    #[validate(range(min = 0))]
    pub page_number: i32,
    pub exercise: Exercise,
    pub answer: Answer,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShowResultsPayload {
    pub show: bool,
}
