use crate::dto::lecture_dto::ShowResultsPayload;
use crate::dto::quiz_dto::{CreateQuizPayload, CreateQuizResponse};
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use validator::Validate;

#[axum::debug_handler]
pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<String>,
    Json(payload): Json<CreateQuizPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let (id, quiz) = state
        .quiz_service
        .create_quiz(&course_id, &claims.sub, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(CreateQuizResponse { id, quiz })))
}

#[axum::debug_handler]
pub async fn show_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, quiz_id)): Path<(String, String)>,
    Json(payload): Json<ShowResultsPayload>,
) -> Result<impl IntoResponse> {
    let quiz = state
        .quiz_service
        .set_show_results(&course_id, &quiz_id, &claims.sub, payload.show)
        .await?;
    Ok(Json(quiz))
}

#[axum::debug_handler]
pub async fn end_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, quiz_id)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let quiz = state
        .quiz_service
        .end_quiz(&course_id, &quiz_id, &claims.sub)
        .await?;
    Ok(Json(quiz))
}

#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    /// Whose attempt to score; defaults to the caller.
    pub user: Option<String>,
}

#[axum::debug_handler]
pub async fn quiz_result(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, quiz_id)): Path<(String, String)>,
    Query(query): Query<ResultQuery>,
) -> Result<impl IntoResponse> {
    let user_id = query.user.unwrap_or_else(|| claims.sub.clone());
    let result = state
        .quiz_service
        .quiz_result(&course_id, &quiz_id, &user_id, &claims.sub)
        .await?;
    Ok(Json(result))
}

#[axum::debug_handler]
pub async fn quiz_distributions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, quiz_id)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let distributions = state
        .quiz_service
        .distributions(&course_id, &quiz_id, &claims.sub)
        .await?;
    Ok(Json(distributions))
}
