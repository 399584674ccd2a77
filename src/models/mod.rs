pub mod course;
pub mod exercise;
pub mod flashcard;
pub mod lecture;
pub mod quiz;
pub mod quiz_attempt;
