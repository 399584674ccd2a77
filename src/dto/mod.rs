pub mod function_dto;
pub mod generate_dto;
pub mod lecture_dto;
pub mod quiz_dto;
