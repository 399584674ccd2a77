use crate::dto::generate_dto::{GeneratePayload, GeneratedFlashcardsResponse, GeneratedQuizResponse};
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::services::course_service::ensure_professor;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use validator::Validate;

#[axum::debug_handler]
pub async fn generate_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<String>,
    Json(payload): Json<GeneratePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    ensure_professor(state.store.as_ref(), &course_id, &claims.sub).await?;

    let parsed = state.ai_service.generate_quiz(&payload.content).await?;
    let answers = parsed.items.iter().map(|exercise| exercise.answer_key()).collect();
    Ok(Json(GeneratedQuizResponse {
        exercises: parsed.items,
        answers,
        warnings: parsed.warnings,
    }))
}

#[axum::debug_handler]
pub async fn generate_flashcards(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<String>,
    Json(payload): Json<GeneratePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    ensure_professor(state.store.as_ref(), &course_id, &claims.sub).await?;

    let parsed = state.ai_service.generate_flashcards(&payload.content).await?;
    Ok(Json(GeneratedFlashcardsResponse {
        cards: parsed.items,
        warnings: parsed.warnings,
    }))
}
