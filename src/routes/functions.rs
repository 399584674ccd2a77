//! Callable functions. Both always answer 200; failure is carried in the body
//! as `{status: 0, error}` so existing clients keep working.

use crate::dto::function_dto::{CallResponse, CreateLectureQuizAttemptArgs, CreateQuizAttemptArgs};
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::services::attempt_service::AttemptReceipt;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Extension, Json};
use validator::Validate;

async fn quiz_attempt(state: &AppState, user_id: &str, args: CreateQuizAttemptArgs) -> Result<AttemptReceipt> {
    args.validate()?;
    state
        .attempt_service
        .create_quiz_attempt(
            &args.course_id,
            &args.quiz_id,
            args.path.as_deref(),
            args.quiz_attempt.answers,
            user_id,
        )
        .await
}

async fn lecture_quiz_attempt(
    state: &AppState,
    user_id: &str,
    args: CreateLectureQuizAttemptArgs,
) -> Result<AttemptReceipt> {
    args.validate()?;
    state
        .attempt_service
        .create_lecture_quiz_attempt(
            &args.course_id,
            &args.lecture_id,
            &args.lecture_event_id,
            args.lecture_quiz_attempt,
            user_id,
        )
        .await
}

#[axum::debug_handler]
pub async fn create_quiz_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(args): Json<CreateQuizAttemptArgs>,
) -> impl IntoResponse {
    Json(CallResponse::from_result(
        quiz_attempt(&state, &claims.sub, args).await,
    ))
}

#[axum::debug_handler]
pub async fn create_lecture_quiz_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(args): Json<CreateLectureQuizAttemptArgs>,
) -> impl IntoResponse {
    Json(CallResponse::from_result(
        lecture_quiz_attempt(&state, &claims.sub, args).await,
    ))
}
