use crate::dto::lecture_dto::{CreateLectureQuizPayload, ShowResultsPayload};
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;
use validator::Validate;

#[axum::debug_handler]
pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, lecture_id)): Path<(String, String)>,
    Json(payload): Json<CreateLectureQuizPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let event = state
        .lecture_quiz_service
        .create_quiz(
            &course_id,
            &lecture_id,
            &claims.sub,
            payload.page_number,
            payload.exercise,
            payload.answer,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

#[axum::debug_handler]
pub async fn list_quizzes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, lecture_id)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let pools = state
        .lecture_quiz_service
        .pools(&course_id, &lecture_id, &claims.sub)
        .await?;
    Ok(Json(pools))
}

#[axum::debug_handler]
pub async fn select_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, lecture_id, event_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse> {
    let replaced = state
        .lecture_quiz_service
        .select(&course_id, &lecture_id, &event_id, &claims.sub)
        .await?;
    Ok(Json(json!({ "active": event_id, "replaced": replaced })))
}

#[axum::debug_handler]
pub async fn show_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, lecture_id, event_id)): Path<(String, String, String)>,
    Json(payload): Json<ShowResultsPayload>,
) -> Result<impl IntoResponse> {
    let event = state
        .lecture_quiz_service
        .set_show_results(&course_id, &lecture_id, &event_id, &claims.sub, payload.show)
        .await?;
    Ok(Json(event))
}

#[axum::debug_handler]
pub async fn end_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, lecture_id, event_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse> {
    let event = state
        .lecture_quiz_service
        .end(&course_id, &lecture_id, &event_id, &claims.sub)
        .await?;
    Ok(Json(event))
}

#[axum::debug_handler]
pub async fn clear_active(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, lecture_id)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let replaced = state
        .lecture_quiz_service
        .clear_active(&course_id, &lecture_id, &claims.sub)
        .await?;
    Ok(Json(json!({ "active": null, "replaced": replaced })))
}

#[axum::debug_handler]
pub async fn quiz_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, lecture_id, event_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse> {
    let results = state
        .lecture_quiz_service
        .results(&course_id, &lecture_id, &event_id, &claims.sub)
        .await?;
    Ok(Json(results))
}
