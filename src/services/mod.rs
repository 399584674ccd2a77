pub mod ai_service;
pub mod attempt_service;
pub mod course_service;
pub mod distribution_service;
pub mod grading_service;
pub mod lecture_quiz_service;
pub mod parser_service;
pub mod quiz_service;
